use std::sync::Arc;

use plate_paste::{
    CODE_ORIGIN_FORMAT, ContentConverter, ConvertError, Document, Editor, Fragment, MimeBundle,
    Mutation, NODE_SNAPSHOT_FORMAT, Node, PasteHandler, PastedFile, PlainTextConverter, RuleId,
    Schema, Selection, encode_node_snapshot,
};

/// Always answers with a titled document, whatever it was asked for.
struct TitledConverter;

impl ContentConverter for TitledConverter {
    fn markdown_to_document(
        &self,
        _schema: &Schema,
        _markdown: &str,
        _need_title: bool,
    ) -> Result<Fragment, ConvertError> {
        Ok(vec![Node::title("Imported"), Node::paragraph("text")])
    }

    fn html_to_document(
        &self,
        schema: &Schema,
        html: &str,
        need_title: bool,
        _default_title: Option<&str>,
    ) -> Result<Fragment, ConvertError> {
        self.markdown_to_document(schema, html, need_title)
    }

    fn html_slice_to_fragment(
        &self,
        _schema: &Schema,
        _html: &str,
    ) -> Result<Fragment, ConvertError> {
        Err(ConvertError::Unsupported { format: "html" })
    }

    fn document_to_markdown(&self, _fragment: &[Node]) -> Result<String, ConvertError> {
        Ok(String::new())
    }
}

fn handler(converter: Arc<dyn ContentConverter>) -> PasteHandler {
    PasteHandler::new(converter, Arc::new(|_: &PastedFile| {}))
}

fn notes_editor(selection: Selection) -> Editor {
    let doc = Document::new(vec![Node::title("Notes"), Node::paragraph("body")]);
    Editor::new(doc, selection, Arc::new(Schema::standard())).unwrap()
}

#[test]
fn converted_title_is_demoted_when_the_title_is_filled() {
    let handler = handler(Arc::new(TitledConverter));
    let mut editor = notes_editor(Selection::caret(12));

    handler
        .handle_paste(&mut editor, &MimeBundle::new().with_text("# Imported\ntext"))
        .unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::title("Notes"),
            Node::paragraph("body"),
            Node::paragraph("Imported"),
            Node::paragraph("text"),
        ]
    );
}

#[test]
fn converted_title_replaces_everything_before_the_selection_when_needed() {
    let handler = handler(Arc::new(TitledConverter));
    let doc = Document::new(vec![Node::title(""), Node::paragraph("draft")]);
    // Caret after "dr".
    let mut editor = Editor::new(doc, Selection::caret(5), Arc::new(Schema::standard())).unwrap();

    handler
        .handle_paste(&mut editor, &MimeBundle::new().with_text("# Imported\ntext"))
        .unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::title("Imported"),
            Node::paragraph("text"),
            Node::paragraph("aft"),
        ]
    );
}

#[test]
fn block_paste_with_caret_in_title_lands_after_it() {
    let handler = handler(Arc::new(PlainTextConverter));
    let mut editor = notes_editor(Selection::caret(3));

    let bundle = MimeBundle::new()
        .with_data(CODE_ORIGIN_FORMAT, r#"{"mode":"python"}"#)
        .with_html("<pre>print(1)</pre>")
        .with_text("print(1)");
    let outcome = handler.handle_paste(&mut editor, &bundle).unwrap();

    assert_eq!(outcome.rule, Some(RuleId::IdeCode));
    assert_eq!(
        editor.doc().children,
        vec![
            Node::title("Notes"),
            Node::code_block("python", "print(1)"),
            Node::paragraph("body"),
        ]
    );
    assert_eq!(editor.selection(), Selection::caret(16));
}

#[test]
fn copied_title_node_is_pasted_as_a_paragraph() {
    let handler = handler(Arc::new(PlainTextConverter));
    let mut editor = notes_editor(Selection::caret(12));

    let snapshot = encode_node_snapshot(&Node::title("Copied")).unwrap();
    let outcome = handler
        .handle_paste(
            &mut editor,
            &MimeBundle::new().with_data(NODE_SNAPSHOT_FORMAT, snapshot),
        )
        .unwrap();

    assert_eq!(outcome.rule, Some(RuleId::InternalNode));
    assert_eq!(
        editor.doc().children,
        vec![
            Node::title("Notes"),
            Node::paragraph("bod"),
            Node::paragraph("Copied"),
            Node::paragraph("y"),
        ]
    );
}

#[test]
fn plain_text_can_fill_the_title_itself() {
    let handler = handler(Arc::new(PlainTextConverter));
    let mut editor = Editor::empty(Arc::new(Schema::standard()));
    editor.set_selection(Selection::caret(1));

    let outcome = handler
        .handle_paste(
            &mut editor,
            &MimeBundle::new().with_html("<b>Hello</b>").with_text("Hello"),
        )
        .unwrap();

    assert_eq!(outcome.rule, Some(RuleId::PlainText));
    assert_eq!(
        editor.doc().children,
        vec![Node::title("Hello"), Node::paragraph("")]
    );
    assert_eq!(editor.selection(), Selection::caret(6));
}

#[test]
fn documents_without_a_title_slot_never_get_one() {
    let handler = handler(Arc::new(TitledConverter));
    let mut editor = Editor::empty(Arc::new(Schema::without_title()));
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);

    handler
        .handle_paste(&mut editor, &MimeBundle::new().with_text("# Imported\ntext"))
        .unwrap();

    // No title kind in this schema.
    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("Imported"), Node::paragraph("text")]
    );
}

#[test]
fn select_all_plain_text_paste_keeps_the_title() {
    let handler = handler(Arc::new(PlainTextConverter));
    let mut editor = notes_editor(Selection::new(0, 13));

    let bundle = MimeBundle::new().with_html("<b>hello</b>").with_text("hello");
    let outcome = handler.handle_paste(&mut editor, &bundle).unwrap();

    assert_eq!(outcome.rule, Some(RuleId::PlainText));
    assert_eq!(outcome.mutation, Mutation::InsertLiteralText { at: 1, len: 5 });
    assert_eq!(editor.doc().children, vec![Node::title("hello")]);
    assert_eq!(editor.selection(), Selection::caret(6));

    let mut editor = notes_editor(Selection::new(0, 8));
    handler
        .handle_paste(&mut editor, &MimeBundle::new().with_html("<i>x</i>").with_text("x"))
        .unwrap();

    assert_eq!(editor.doc().children, vec![Node::title("xbody")]);
}

#[test]
fn converted_title_at_the_very_start_replaces_the_empty_title() {
    let handler = handler(Arc::new(TitledConverter));
    let mut editor = Editor::empty(Arc::new(Schema::standard()));
    editor.set_selection(Selection::caret(0));

    let outcome = handler
        .handle_paste(&mut editor, &MimeBundle::new().with_text("# Imported\ntext"))
        .unwrap();

    assert_eq!(outcome.rule, Some(RuleId::Markdown));
    assert_eq!(outcome.mutation, Mutation::ReplaceRange { from: 0, to: 2 });
    assert_eq!(
        editor.doc().children,
        vec![
            Node::title("Imported"),
            Node::paragraph("text"),
            Node::paragraph(""),
        ]
    );
    assert_eq!(editor.selection(), Selection::caret(15));
}
