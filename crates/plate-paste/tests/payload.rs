use serde_json::json;

use plate_paste::{
    CODE_ORIGIN_FORMAT, ClipboardPayload, ContentConverter, ConvertError, MARKDOWN_FORMAT,
    MimeBundle, NODE_SNAPSHOT_FORMAT, Node, PasteConfig, PastedFile, PlainTextConverter, Schema,
    SchemaError, SnapshotError, decode_node_snapshot, encode_node_snapshot,
};

#[test]
fn missing_formats_become_empty_or_absent() {
    let payload = ClipboardPayload::from_transfer(&MimeBundle::new());
    assert_eq!(payload, ClipboardPayload::default());
    assert!(!payload.has_files());
}

#[test]
fn empty_optional_formats_count_as_absent() {
    let bundle = MimeBundle::new()
        .with_text("plain")
        .with_data(MARKDOWN_FORMAT, "")
        .with_data(NODE_SNAPSHOT_FORMAT, "");
    let payload = ClipboardPayload::from(&bundle);

    assert_eq!(payload.plain_text, "plain");
    assert_eq!(payload.html, "");
    assert_eq!(payload.markdown_text, None);
    assert_eq!(payload.internal_node, None);
}

#[test]
fn code_language_comes_from_ide_metadata() {
    let metadata = json!({ "version": 1, "isFromEmptySelection": false, "mode": "typescript" });
    let bundle = MimeBundle::new().with_data(CODE_ORIGIN_FORMAT, metadata.to_string());
    assert_eq!(
        ClipboardPayload::from(&bundle).code_language.as_deref(),
        Some("typescript")
    );

    let unreadable = MimeBundle::new().with_data(CODE_ORIGIN_FORMAT, "not json");
    assert_eq!(ClipboardPayload::from(&unreadable).code_language, None);

    let no_mode = MimeBundle::new().with_data(CODE_ORIGIN_FORMAT, r#"{"mode":""}"#);
    assert_eq!(ClipboardPayload::from(&no_mode).code_language, None);
}

#[test]
fn files_keep_their_order() {
    let bundle = MimeBundle::new()
        .with_file(PastedFile::new("b.png", "image/png", vec![0; 3]))
        .with_file(PastedFile::new("a.png", "image/png", Vec::new()));
    let payload = ClipboardPayload::from(&bundle);

    let names: Vec<_> = payload.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["b.png", "a.png"]);
    assert_eq!(payload.files[0].len(), 3);
    assert!(payload.files[1].is_empty());
}

#[test]
fn node_snapshot_fills_schema_defaults() -> anyhow::Result<()> {
    let schema = Schema::standard();
    let raw = json!({ "node": "void", "kind": "mind", "attrs": { "height": 400 } }).to_string();

    let node = decode_node_snapshot(&raw, &schema)?;

    let attrs = node.attrs().unwrap();
    assert_eq!(attrs["height"], 400);
    assert_eq!(attrs["width"], "100%");
    assert_eq!(attrs["template"], "default");
    assert_eq!(attrs["data"]["root"]["data"]["text"], "Central topic");
    Ok(())
}

#[test]
fn node_snapshot_defaults_reach_nested_nodes() -> anyhow::Result<()> {
    let schema = Schema::standard();
    let raw = json!({
        "node": "element",
        "kind": "blockquote",
        "children": [{
            "node": "element",
            "kind": "heading",
            "children": [{ "node": "text", "text": "Quote" }],
        }],
    })
    .to_string();

    let node = decode_node_snapshot(&raw, &schema)?;

    assert_eq!(node, Node::blockquote(vec![Node::heading(1, "Quote")]));
    Ok(())
}

#[test]
fn snapshot_encoding_is_stable() -> anyhow::Result<()> {
    let schema = Schema::standard();
    let original = Node::code_block("rust", "fn main() {}");

    let encoded = encode_node_snapshot(&original)?;
    assert_eq!(decode_node_snapshot(&encoded, &schema)?, original);
    assert_eq!(encode_node_snapshot(&original)?, encoded);
    Ok(())
}

#[test]
fn snapshots_outside_the_schema_are_rejected() {
    let schema = Schema::standard();

    let err = decode_node_snapshot("{", &schema).unwrap_err();
    assert!(matches!(err, SnapshotError::Json(_)));

    let err = decode_node_snapshot(r#"{"node":"element","kind":"table"}"#, &schema).unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::Schema(SchemaError::UnknownKind(kind)) if kind == "table"
    ));

    let marked = json!({
        "node": "element",
        "kind": "code_block",
        "children": [{ "node": "text", "text": "x", "marks": { "bold": true } }],
    });
    let err = decode_node_snapshot(&marked.to_string(), &schema).unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::Schema(SchemaError::MarksNotAllowed(_))
    ));
}

#[test]
fn config_fields_fall_back_to_defaults() {
    let config = PasteConfig::from_json_str("{}").unwrap();
    assert_eq!(config, PasteConfig::default());
    assert_eq!(config.slice_marker, "data-pm-slice");

    let config = PasteConfig::from_json_str(r#"{"markdown_language":"md"}"#).unwrap();
    assert_eq!(config.markdown_language, "md");
    assert_eq!(config.office_marker, "urn:schemas-microsoft-com:office");

    let json = config.to_json_pretty().unwrap();
    assert_eq!(PasteConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn plain_text_converter_makes_one_paragraph_per_line() {
    let schema = Schema::standard();
    let fragment = PlainTextConverter
        .markdown_to_document(&schema, "first\n\n  \nsecond", true)
        .unwrap();

    assert_eq!(
        fragment,
        vec![
            Node::title(""),
            Node::paragraph("first"),
            Node::paragraph("second"),
        ]
    );

    let err = PlainTextConverter
        .html_to_document(&schema, "<p>x</p>", false, None)
        .unwrap_err();
    assert!(matches!(err, ConvertError::Unsupported { format: "html" }));
}

#[test]
fn plain_text_converter_writes_markdown() {
    let fragment = vec![
        Node::title("Doc"),
        Node::heading(2, "Part"),
        Node::blockquote(vec![Node::paragraph("quoted")]),
        Node::code_block("sh", "ls"),
        Node::divider(),
    ];

    let markdown = PlainTextConverter.document_to_markdown(&fragment).unwrap();

    assert_eq!(
        markdown,
        "# Doc\n\n## Part\n\n> quoted\n\n```sh\nls\n```\n\n---"
    );
}
