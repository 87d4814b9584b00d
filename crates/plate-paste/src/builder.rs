use serde::{Deserialize, Serialize};

use crate::core::{ApplyError, Document, Fragment, Mark, Node};
use crate::ops::{Step, Transaction};
use crate::position::{Selection, marks_before, text_position_near};
use crate::predicates::title_end;
use crate::replace::Span;
use crate::rules::{Plan, RuleContext};
use crate::schema::{PARAGRAPH, Schema, TITLE};

/// The document change a handled gesture produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// A node landed at `at` in the new document.
    InsertFragment { at: usize, size: usize },
    /// `from..to` of the old document was replaced.
    ReplaceRange { from: usize, to: usize },
    ApplyMarkOverRange { from: usize, to: usize },
    /// Text of `len` positions now starts at `at`.
    InsertLiteralText { at: usize, len: usize },
    IntakeFiles { count: usize },
    NoOp,
}

/// Records steps against a draft document so later steps can use positions of earlier results.
pub struct TransactionBuilder<'a> {
    schema: &'a Schema,
    draft: Document,
    steps: Vec<Step>,
    selection_after: Option<Selection>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(doc: &Document, schema: &'a Schema) -> Self {
        Self {
            schema,
            draft: doc.clone(),
            steps: Vec::new(),
            selection_after: None,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.draft
    }

    pub fn replace(
        &mut self,
        from: usize,
        to: usize,
        fragment: Fragment,
    ) -> Result<Span, ApplyError> {
        let step = Step::Replace { from, to, fragment };
        let (doc, span) = step.apply(&self.draft, self.schema)?;
        self.draft = doc;
        self.steps.push(step);
        Ok(span)
    }

    /// Like [`Self::replace`], but block content never lands inside or before a leading title
    /// and never carries a title of its own. Returns the range actually replaced.
    pub fn replace_fitted(
        &mut self,
        from: usize,
        to: usize,
        fragment: Fragment,
    ) -> Result<(usize, usize, Span), ApplyError> {
        if fragment.iter().all(|node| self.schema.is_inline(node)) {
            let (from, to) = clamp_into_title(&self.draft, from, to);
            let span = self.replace(from, to, fragment)?;
            return Ok((from, to, span));
        }
        let (from, to) = clamp_past_title(&self.draft, from, to);
        let span = self.replace(from, to, demote_titles(fragment))?;
        Ok((from, to, span))
    }

    /// Inserts text carrying the marks of the text before `from` (links excluded).
    pub fn insert_text(&mut self, from: usize, to: usize, text: &str) -> Result<Span, ApplyError> {
        let (from, to) = clamp_into_title(&self.draft, from, to);
        let fragment = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::marked_text(
                text,
                marks_before(&self.draft, self.schema, from),
            )]
        };
        self.replace(from, to, fragment)
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<(), ApplyError> {
        let step = Step::AddMark { from, to, mark };
        self.draft = step.apply(&self.draft, self.schema)?.0;
        self.steps.push(step);
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection_after = Some(selection);
    }

    /// Closest text position at or before `pos` in the draft.
    pub fn caret_near(&self, pos: usize) -> usize {
        text_position_near(&self.draft, self.schema, pos)
    }

    pub fn finish(self) -> Transaction {
        let tx = Transaction::new(self.steps);
        match self.selection_after {
            Some(selection) => tx.selection_after(selection),
            None => tx,
        }
    }
}

/// Maps a rule's plan onto steps against the context's document.
pub fn plan_transaction(
    plan: &Plan,
    ctx: &RuleContext<'_>,
) -> Result<(Transaction, Mutation), ApplyError> {
    let mut builder = TransactionBuilder::new(ctx.doc, ctx.schema);
    let selection = ctx.selection;

    let mutation = match plan {
        Plan::InsertNode { node } => {
            let mut at = selection.from.saturating_sub(1);
            let fragment = if ctx.schema.is_inline(node) {
                at = clamp_into_title(ctx.doc, at, at).0;
                vec![node.clone()]
            } else {
                at = clamp_past_title(ctx.doc, at, at).0;
                demote_titles(vec![node.clone()])
            };
            let size_before = builder.doc().content_size();
            let span = builder.replace(at, at, fragment)?;
            let grown = builder.doc().content_size().saturating_sub(size_before);
            let map = |pos: usize| if pos >= at { pos + grown } else { pos };
            builder.set_selection(Selection::new(
                builder.caret_near(map(selection.from)),
                builder.caret_near(map(selection.to)),
            ));
            Mutation::InsertFragment {
                at: span.start,
                size: span.end - span.start,
            }
        }
        Plan::ReplaceSelection { fragment } => {
            let (from, to, span) =
                builder.replace_fitted(selection.from, selection.to, fragment.clone())?;
            builder.set_selection(Selection::caret(builder.caret_near(span.end)));
            Mutation::ReplaceRange { from, to }
        }
        Plan::SpliceConverted { fragment } => {
            let (from, to, span) = if ctx.title.need_title() && starts_with_title(fragment) {
                // The existing empty title is always part of what gets replaced.
                let to = title_end(ctx.doc).map_or(selection.to, |end| selection.to.max(end));
                let span = builder.replace(0, to, fragment.clone())?;
                (0, to, span)
            } else {
                builder.replace_fitted(selection.from, selection.to, fragment.clone())?
            };
            builder.set_selection(Selection::caret(builder.caret_near(span.end)));
            Mutation::ReplaceRange { from, to }
        }
        Plan::IntakeFiles { files } => Mutation::IntakeFiles { count: files.len() },
        Plan::LinkSelection { href } => {
            builder.add_mark(selection.from, selection.to, Mark::link(href.clone()))?;
            builder.set_selection(selection);
            Mutation::ApplyMarkOverRange {
                from: selection.from,
                to: selection.to,
            }
        }
        Plan::InsertLink { href } => {
            let span = builder.insert_text(selection.from, selection.to, href)?;
            builder.add_mark(span.start, span.end, Mark::link(href.clone()))?;
            builder.set_selection(Selection::caret(span.end));
            Mutation::InsertLiteralText {
                at: span.start,
                len: span.end - span.start,
            }
        }
        Plan::InsertText { text } => {
            let span = builder.insert_text(selection.from, selection.to, text)?;
            builder.set_selection(Selection::caret(span.end));
            Mutation::InsertLiteralText {
                at: span.start,
                len: span.end - span.start,
            }
        }
        Plan::InsertCodeBlock { language, text } => {
            let node = Node::code_block(language.clone(), text.clone());
            let (from, to, span) =
                builder.replace_fitted(selection.from, selection.to, vec![node])?;
            // End of the code text, inside the new block.
            builder.set_selection(Selection::caret(span.end - 1));
            Mutation::ReplaceRange { from, to }
        }
    };

    Ok((builder.finish(), mutation))
}

fn starts_with_title(fragment: &[Node]) -> bool {
    fragment.first().is_some_and(|node| node.kind() == TITLE)
}

/// Moves a block insertion range so it starts after a leading title node.
fn clamp_past_title(doc: &Document, from: usize, to: usize) -> (usize, usize) {
    match title_end(doc) {
        Some(end) if from < end => (end, to.max(end)),
        _ => (from, to),
    }
}

/// Moves an inline insertion that starts before a leading title into the title's content.
fn clamp_into_title(doc: &Document, from: usize, to: usize) -> (usize, usize) {
    match title_end(doc) {
        Some(_) if from == 0 => (1, to.max(1)),
        _ => (from, to),
    }
}

/// Titles only exist at the head of a document; anywhere else they become paragraphs.
fn demote_titles(fragment: Fragment) -> Fragment {
    fragment
        .into_iter()
        .map(|node| match node {
            Node::Element(mut el) if el.kind == TITLE => {
                el.kind = PARAGRAPH.to_string();
                el.attrs.clear();
                Node::Element(el)
            }
            other => other,
        })
        .collect()
}
