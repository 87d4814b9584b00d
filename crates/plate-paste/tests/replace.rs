use plate_paste::{
    ApplyError, Document, Mark, Marks, Node, Schema, Span, TransactionBuilder, add_mark,
    marks_before, replace, resolve, text_position_near, textblock_ranges,
};

fn bold() -> Marks {
    Marks {
        bold: true,
        ..Marks::default()
    }
}

#[test]
fn inline_text_is_spliced_into_the_textblock() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::paragraph("held")]);

    let (doc, span) = replace(&doc, 3, 3, &[Node::text("llo wor")], &schema).unwrap();

    assert_eq!(doc.children, vec![Node::paragraph("hello world")]);
    assert_eq!(span, Span { start: 3, end: 10 });
}

#[test]
fn block_insert_splits_the_textblock() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::paragraph("abcd")]);

    let (doc, span) = replace(&doc, 3, 3, &[Node::divider()], &schema).unwrap();

    assert_eq!(
        doc.children,
        vec![Node::paragraph("ab"), Node::divider(), Node::paragraph("cd")]
    );
    assert_eq!(span, Span { start: 4, end: 5 });
}

#[test]
fn block_insert_at_textblock_edges_drops_empty_halves() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::paragraph("abcd")]);

    let (at_end, _) = replace(&doc, 5, 5, &[Node::heading(2, "H")], &schema).unwrap();
    assert_eq!(
        at_end.children,
        vec![Node::paragraph("abcd"), Node::heading(2, "H")]
    );

    let (at_start, span) = replace(&doc, 1, 1, &[Node::heading(2, "H")], &schema).unwrap();
    assert_eq!(
        at_start.children,
        vec![Node::heading(2, "H"), Node::paragraph("abcd")]
    );
    assert_eq!(span, Span { start: 0, end: 3 });
}

#[test]
fn inline_replace_across_blocks_joins_them() {
    let schema = Schema::standard();
    // "abc" text at 1..4, "def" text at 6..9.
    let doc = Document::new(vec![Node::paragraph("abc"), Node::paragraph("def")]);

    let (doc, span) = replace(&doc, 2, 8, &[Node::text("X")], &schema).unwrap();

    assert_eq!(doc.children, vec![Node::paragraph("aXf")]);
    assert_eq!(span, Span { start: 2, end: 3 });
}

#[test]
fn deleting_a_range_inside_a_container() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::blockquote(vec![Node::paragraph("quoted")])]);

    let (doc, span) = replace(&doc, 3, 5, &[], &schema).unwrap();

    assert_eq!(
        doc.children,
        vec![Node::blockquote(vec![Node::paragraph("qted")])]
    );
    assert_eq!(span, Span { start: 3, end: 3 });
}

#[test]
fn marks_are_stripped_for_textblocks_that_disallow_them() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::code_block("rust", "ab")]);

    let (doc, _) = replace(&doc, 2, 2, &[Node::marked_text("X", bold())], &schema).unwrap();

    assert_eq!(doc.children, vec![Node::code_block("rust", "aXb")]);
}

#[test]
fn out_of_range_positions_are_rejected() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::paragraph("ab")]);

    let err = replace(&doc, 9, 9, &[Node::divider()], &schema).unwrap_err();
    assert!(matches!(err, ApplyError::OutOfBounds { pos: 9, size: 4 }));

    let err = replace(&doc, 3, 2, &[], &schema).unwrap_err();
    assert!(matches!(err, ApplyError::InvalidRange { from: 3, to: 2 }));
}

#[test]
fn add_mark_splits_text_and_skips_markless_blocks() {
    let schema = Schema::standard();
    let doc = Document::new(vec![
        Node::paragraph("hello"),
        Node::code_block("rust", "cd"),
    ]);

    let doc = add_mark(&doc, 2, 11, &Mark::Bold, &schema).unwrap();

    assert_eq!(
        doc.children[0].children(),
        &[Node::text("h"), Node::marked_text("ello", bold())]
    );
    assert_eq!(doc.children[1], Node::code_block("rust", "cd"));
}

#[test]
fn resolve_reports_the_parent_chain() {
    let doc = Document::new(vec![
        Node::title("T"),
        Node::blockquote(vec![Node::paragraph("quoted")]),
    ]);

    let inside = resolve(&doc, 6).unwrap();
    assert_eq!(inside.path, vec![1, 0]);
    assert_eq!(inside.parent_kind(), Some("paragraph"));
    assert!(inside.has_ancestor("blockquote"));
    assert_eq!(inside.parent_offset, 1);

    let between = resolve(&doc, 3).unwrap();
    assert_eq!(between.depth(), 0);
    assert_eq!(between.parent_kind(), None);

    assert!(resolve(&doc, 100).is_err());
}

#[test]
fn text_positions_snap_back_to_the_nearest_textblock() {
    let schema = Schema::standard();
    let doc = Document::new(vec![
        Node::paragraph("ab"),
        Node::divider(),
        Node::paragraph("cd"),
    ]);

    assert_eq!(textblock_ranges(&doc, &schema), vec![(1, 3), (6, 8)]);
    assert_eq!(text_position_near(&doc, &schema, 2), 2);
    assert_eq!(text_position_near(&doc, &schema, 5), 3);
    assert_eq!(text_position_near(&doc, &schema, 0), 1);
    assert_eq!(text_position_near(&doc, &schema, 9), 8);
}

#[test]
fn marks_before_ignores_links_and_markless_parents() {
    let schema = Schema::standard();
    let linked = Marks {
        italic: true,
        link: Some("https://example.com".to_string()),
        ..Marks::default()
    };
    let doc = Document::new(vec![
        Node::element(
            "paragraph",
            Default::default(),
            vec![Node::text("a"), Node::marked_text("b", linked)],
        ),
        Node::code_block("rust", "c"),
    ]);

    let inherited = marks_before(&doc, &schema, 3);
    assert!(inherited.italic);
    assert_eq!(inherited.link, None);
    assert!(marks_before(&doc, &schema, 2).is_empty());
    assert!(marks_before(&doc, &schema, 6).is_empty());
}

#[test]
fn builder_steps_see_earlier_results() {
    let schema = Schema::standard();
    let doc = Document::new(vec![Node::paragraph("")]);
    let mut builder = TransactionBuilder::new(&doc, &schema);

    let span = builder.insert_text(1, 1, "docs").unwrap();
    builder
        .add_mark(span.start, span.end, Mark::link("https://docs.rs"))
        .unwrap();
    let tx = builder.finish();

    assert_eq!(tx.steps.len(), 2);
    assert_eq!(tx.selection_after, None);

    let mut replayed = doc.clone();
    for step in &tx.steps {
        replayed = step.apply(&replayed, &schema).unwrap().0;
    }
    let linked = Marks {
        link: Some("https://docs.rs".to_string()),
        ..Marks::default()
    };
    assert_eq!(
        replayed.children,
        vec![Node::element(
            "paragraph",
            Default::default(),
            vec![Node::marked_text("docs", linked)]
        )]
    );
}
