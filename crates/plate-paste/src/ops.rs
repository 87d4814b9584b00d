use serde::{Deserialize, Serialize};

use crate::core::{ApplyError, Document, Fragment, Mark};
use crate::position::Selection;
use crate::replace::{Span, add_mark, replace};
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Replace {
        from: usize,
        to: usize,
        #[serde(default)]
        fragment: Fragment,
    },
    AddMark {
        from: usize,
        to: usize,
        mark: Mark,
    },
}

impl Step {
    /// Returns the new document and the span the step touched in it.
    pub fn apply(&self, doc: &Document, schema: &Schema) -> Result<(Document, Span), ApplyError> {
        match self {
            Step::Replace { from, to, fragment } => replace(doc, *from, *to, fragment, schema),
            Step::AddMark { from, to, mark } => {
                let doc = add_mark(doc, *from, *to, mark, schema)?;
                Ok((
                    doc,
                    Span {
                        start: *from,
                        end: *to,
                    },
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            selection_after: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn selection_after(mut self, selection_after: Selection) -> Self {
        self.selection_after = Some(selection_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }
}
