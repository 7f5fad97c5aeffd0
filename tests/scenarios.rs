//! Integration tests exercising the testable scenarios and invariants from the
//! specification, end to end through the public `Converter` API.

use txt2html_lib::config::Config;
use txt2html_lib::{Continuation, Converter};

fn converter(cfg: Config) -> Converter {
    Converter::new(cfg)
}

#[test]
fn short_lines_get_breaks_and_all_caps_wraps_in_strong() {
    let mut conv = converter(Config::default());
    let (frag, _) = conv.convert_fragment(
        "Matty had a little truck\nhe drove it round and round\nand everywhere that Matty went\nthe truck was found.",
        true,
    );
    assert!(frag.starts_with("<P>Matty had a little truck<BR>"));
    assert!(frag.contains("he drove it round and round<BR>"));
    assert!(frag.contains("and everywhere that Matty went<BR>"));
}

#[test]
fn numbered_list_produces_ol_with_four_items() {
    let mut cfg = Config::default();
    cfg.normalize();
    let mut conv = converter(cfg);
    let (frag, _) = conv.convert_fragment("1. Spam\n2. Jam\n3. Ham\n4. Pickles", true);
    assert!(frag.contains("<OL><LI>Spam"));
    assert_eq!(frag.matches("<LI>").count(), 4);
    assert!(frag.trim_end().ends_with("</OL>"));
}

#[test]
fn table_mode_renders_three_rows_two_left_aligned_columns() {
    let mut cfg = Config::default();
    cfg.make_tables = true;
    let mut conv = converter(cfg);
    let (frag, _) = conv.convert_fragment(
        "-e  File exists.\n-z  File has zero size.\n-s  File has nonzero size (returns size).",
        true,
    );
    assert!(frag.contains("<TABLE>"));
    assert_eq!(frag.matches("<TR>").count(), 3);
    assert_eq!(frag.matches("<TD align=\"left\">").count(), 6);
    assert!(frag.trim_end().ends_with("</TABLE>"));
}

#[test]
fn tables_never_appear_when_make_tables_is_false() {
    let mut conv = converter(Config::default());
    let (frag, _) = conv.convert_fragment(
        "-e  File exists.\n-z  File has zero size.\n-s  File has nonzero size (returns size).",
        true,
    );
    assert!(!frag.contains("<TABLE>"));
}

#[test]
fn table_detection_is_idempotent() {
    let mut cfg = Config::default();
    cfg.make_tables = true;
    let mut conv = converter(cfg);
    let input = "-e  File exists.\n-z  File has zero size.";
    let (first, _) = conv.convert_fragment(input, true);
    let (second, _) = conv.convert_fragment(&first, true);
    assert_eq!(first.matches("<TABLE>").count(), second.matches("<TABLE>").count());
}

#[test]
fn underlined_heading_becomes_h1_followed_by_paragraph() {
    let mut conv = converter(Config::default());
    let (frag, _) = conv.convert_fragment("Introduction\n============", true);
    assert!(frag.starts_with("<H1"));
    assert!(frag.contains("Introduction</H1>"));

    let (second, _) = conv.convert_fragment("Hello.", true);
    assert!(second.contains("<P>Hello."));
}

#[test]
fn mosaic_mode_downgrades_equals_underline_to_h1_still() {
    let mut cfg = Config::default();
    cfg.use_mosaic_header = true;
    let mut conv = converter(cfg);
    let (frag, _) = conv.convert_fragment("Introduction\n============", true);
    assert!(frag.starts_with("<H1"));
}

#[test]
fn convert_document_str_balances_all_structural_tags() {
    let mut conv = converter(Config::default());
    let html = conv
        .convert_document_str("- one\n- two\n\nNested paragraph.\n")
        .unwrap();
    assert!(html.contains("<UL>"));
    assert!(html.contains("</UL>"));
    assert!(html.trim_end().ends_with("</HTML>"));
    // every opened list tag is closed by end of document
    assert_eq!(html.matches("<UL>").count(), html.matches("</UL>").count());
}

#[test]
fn fragment_with_close_open_tags_always_balances() {
    let mut conv = converter(Config::default());
    let (frag, cont) = conv.convert_fragment("- a\n  - b\n- c", true);
    assert_eq!(frag.matches("<UL>").count(), frag.matches("</UL>").count());
    assert_eq!(cont, Continuation::default());
}

#[test]
fn fragment_without_closing_carries_state_to_next_call() {
    let mut conv = converter(Config::default());
    let (_first, cont) = conv.convert_fragment("- one", false);
    assert!(cont.list_open);
    let (second, _) = conv.convert_fragment("- two", true);
    assert!(second.contains("<LI>two"));
    assert!(second.trim_end().ends_with("</UL>"));
}

#[test]
fn list_closes_before_a_following_non_list_paragraph() {
    let mut conv = converter(Config::default());
    let html = conv
        .convert_document_str("- one\n- two\n\nJust a plain paragraph after the list.\n")
        .unwrap();
    // The list must close at the paragraph boundary, not linger until end of
    // document — it should appear before the plain paragraph's own <P>, not after.
    let ul_close = html.find("</UL>").expect("list should close");
    let plain_p = html.find("Just a plain paragraph").expect("plain paragraph present");
    assert!(ul_close < plain_p, "list should close before the next paragraph's content");
    assert_eq!(html.matches("<UL>").count(), html.matches("</UL>").count());
}

#[test]
fn xhtml_mode_lowercases_list_table_and_heading_tags() {
    let mut cfg = Config::default();
    cfg.xhtml = true;
    cfg.make_tables = true;
    let mut conv = converter(cfg);

    let (list_frag, _) = conv.convert_fragment("- one\n- two", true);
    assert!(list_frag.contains("<ul>"));
    assert!(list_frag.contains("<li>"));
    assert!(!list_frag.contains("<UL>"));
    assert!(!list_frag.contains("<LI>"));

    let (table_frag, _) = conv.convert_fragment("-e  exists.\n-z  zero size.", true);
    assert!(table_frag.contains("<table>"));
    assert!(table_frag.contains("<tr>"));
    assert!(table_frag.contains("<td "));

    let (heading_frag, _) = conv.convert_fragment("Introduction\n============", true);
    assert!(heading_frag.contains("<h1"));
    assert!(!heading_frag.contains("<H1"));
}

#[test]
fn mail_mode_wraps_quoted_lines_and_detects_message_start() {
    let mut cfg = Config::default();
    cfg.mailmode = true;
    let mut conv = converter(cfg);
    let (frag, _) = conv.convert_fragment("From: someone@example.com\n> quoted reply\n> more quote", true);
    assert!(frag.contains("New Message"));
    assert!(frag.contains("<BR>"));
}

#[test]
fn hyphenated_word_split_across_lines_is_rejoined() {
    let mut conv = converter(Config::default());
    let (frag, _) = conv.convert_fragment("This is a trun-\n    cated sentence.", true);
    assert!(frag.contains("truncated"));
    assert!(!frag.contains("trun-"));
}

#[test]
fn html_special_characters_are_escaped() {
    let mut conv = converter(Config::default());
    let (frag, _) = conv.convert_fragment("R&D <tag> more", true);
    assert!(frag.contains("R&amp;D &lt;tag&gt; more"));
}

#[test]
fn loaded_dictionary_file_links_a_url_mention() {
    let dir = tempfile::tempdir().unwrap();
    let dict_path = dir.path().join("links.dict");
    std::fs::write(&dict_path, "/https?:\\/\\/\\S+/ -> \\0\n").unwrap();

    let mut cfg = Config::default();
    cfg.links_dictionaries = vec![dict_path];
    let mut conv = converter(cfg);
    conv.load_dictionaries().unwrap();

    let (frag, _) = conv.convert_fragment("I like to look at http://www.example.com a lot", true);
    assert_eq!(
        frag.trim(),
        r#"<P>I like to look at <a href="http://www.example.com">http://www.example.com</a> a lot"#
    );
}

#[test]
fn link_only_skips_structural_analysis_but_still_escapes_and_links() {
    let dir = tempfile::tempdir().unwrap();
    let dict_path = dir.path().join("links.dict");
    std::fs::write(&dict_path, "/https?:\\/\\/\\S+/ -> \\0\n").unwrap();

    let mut cfg = Config::default();
    cfg.link_only = true;
    cfg.links_dictionaries = vec![dict_path];
    let mut conv = converter(cfg);
    conv.load_dictionaries().unwrap();

    let (frag, _) = conv.convert_fragment("- not a list <tag> http://example.com", true);
    // no <P>/<LI> wrapping, but HTML is escaped and the link rule still fires
    assert!(!frag.contains("<P>"));
    assert!(!frag.contains("<LI>"));
    assert!(frag.contains("&lt;tag&gt;"));
    assert!(frag.contains(r#"<a href="http://example.com">http://example.com</a>"#));
}

#[test]
fn once_flag_fires_only_for_first_mention_across_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let dict_path = dir.path().join("once.dict");
    std::fs::write(&dict_path, "HTML::TextToHTML -io-> http://example/\n").unwrap();

    let mut cfg = Config::default();
    cfg.links_dictionaries = vec![dict_path];
    let mut conv = converter(cfg);
    conv.load_dictionaries().unwrap();

    let html = conv
        .convert_document_str("See HTML::TextToHTML here.\n\nAnd HTML::TextToHTML again.\n")
        .unwrap();
    assert_eq!(html.matches("<a href=\"http://example/\">").count(), 1);
}
