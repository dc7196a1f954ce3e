use repoprint::contract::{Highlighter, TextRun};
use repoprint::highlight::SyntectHighlighter;
use repoprint::syntax::{markup_to_runs, Palette, DEFAULT_PALETTE};

fn concat(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

#[test]
fn converts_simple_markup_with_correct_colors() {
    let markup =
        r#"<span class="hljs-keyword">const</span> x = <span class="hljs-number">5</span>;"#;

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    let keyword = runs
        .iter()
        .find(|r| r.text == "const" && r.color == Some("#000080"));
    assert!(keyword.is_some(), "expected a keyword-colored 'const' run");

    let number = runs
        .iter()
        .find(|r| r.text == "5" && r.color == Some("#FF4500"));
    assert!(number.is_some(), "expected a number-colored '5' run");

    assert_eq!(concat(&runs), "const x = 5;");
}

#[test]
fn emits_expected_run_sequence_for_single_line() {
    let markup =
        "<span class=\"hljs-keyword\">const</span> x = <span class=\"hljs-number\">5</span>;\n";

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    assert_eq!(
        runs,
        vec![
            TextRun::text("const", Some("#000080")),
            TextRun::text(" x = ", None),
            TextRun::text("5", Some("#FF4500")),
            TextRun::text(";", None),
            TextRun::newline(),
        ]
    );
}

#[test]
fn handles_multiline_markup_with_newline_runs() {
    let markup = "<span class=\"hljs-keyword\">function</span> test() {\n  <span class=\"hljs-keyword\">return</span> <span class=\"hljs-literal\">true</span>;\n}";

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    assert!(runs
        .iter()
        .any(|r| r.text == "function" && r.color == Some("#000080")));
    assert!(runs
        .iter()
        .any(|r| r.text == "return" && r.color == Some("#000080")));
    assert!(runs
        .iter()
        .any(|r| r.text == "true" && r.color == Some("#32CD32")));

    let newlines = runs.iter().filter(|r| r.is_newline()).count();
    assert_eq!(newlines, 2);
}

#[test]
fn removes_empty_lines_when_enabled() {
    let markup = "<span class=\"hljs-keyword\">const</span> x = 5;\n\n<span class=\"hljs-keyword\">const</span> y = 10;";

    let runs = markup_to_runs(markup, true, &DEFAULT_PALETTE);

    let empties = runs.iter().filter(|r| r.text.is_empty()).count();
    assert_eq!(empties, 0, "no empty-text runs may survive suppression");

    // The two statements are now separated by exactly one newline run.
    let newlines = runs.iter().filter(|r| r.is_newline()).count();
    assert_eq!(newlines, 1);
}

#[test]
fn preserves_one_empty_segment_when_suppression_is_off() {
    let markup = "a\n\nb";

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    assert_eq!(
        runs,
        vec![
            TextRun::text("a", None),
            TextRun::newline(),
            TextRun::text("", None),
            TextRun::newline(),
            TextRun::text("b", None),
        ]
    );
    assert_eq!(concat(&runs), "a\n\nb");
}

#[test]
fn decodes_entities() {
    let markup = "<span class=\"hljs-string\">&quot;Hello &amp; World&quot;</span>";

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "\"Hello & World\"");
    assert_eq!(runs[0].color, Some("#006400"));
}

#[test]
fn unmapped_tags_keep_the_current_color() {
    let markup = "<span class=\"hljs-string\">outer<span class=\"totally-unknown\">inner</span></span>";

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    assert_eq!(
        runs,
        vec![
            TextRun::text("outer", Some("#006400")),
            TextRun::text("inner", Some("#006400")),
        ]
    );
}

#[test]
fn maps_syntect_scope_atoms_through_the_palette() {
    // syntect's class style spells scopes as space-separated atoms.
    let markup = "<span class=\"storage type\">fn</span> <span class=\"constant numeric integer\">42</span>";

    let runs = markup_to_runs(markup, false, &DEFAULT_PALETTE);

    assert!(runs
        .iter()
        .any(|r| r.text == "fn" && r.color == Some("#000080")));
    assert!(runs
        .iter()
        .any(|r| r.text == "42" && r.color == Some("#FF4500")));
}

#[test]
fn malformed_markup_never_panics() {
    for markup in [
        "</span></span>text",
        "<span class=\"hljs-keyword\">unclosed",
        "<span>no class</span>",
        "a < b && c > d",
    ] {
        let _ = markup_to_runs(markup, false, &DEFAULT_PALETTE);
        let _ = markup_to_runs(markup, true, &DEFAULT_PALETTE);
    }
}

#[test]
fn substituted_palette_overrides_colors() {
    const TEST_PALETTE: Palette = Palette::new(&[("keyword", "#111111")]);
    let markup = "<span class=\"hljs-keyword\">let</span> <span class=\"hljs-number\">1</span>";

    let runs = markup_to_runs(markup, false, &TEST_PALETTE);

    assert!(runs
        .iter()
        .any(|r| r.text == "let" && r.color == Some("#111111")));
    // The number class has no entry in the substituted palette.
    assert!(runs.iter().any(|r| r.text == "1" && r.color.is_none()));
}

#[test]
fn tokenizer_round_trips_highlighted_text() {
    let text = "fn main() {\n    let x = 1 & 2;\n    println!(\"<{}>\", x);\n}\n";
    let markup = SyntectHighlighter::new()
        .highlight(text, Some("rs"))
        .expect("highlighting succeeds");

    let runs = markup_to_runs(&markup, false, &DEFAULT_PALETTE);

    assert_eq!(concat(&runs), text);
}

#[test]
fn plaintext_markup_round_trips_unknown_languages() {
    let text = "const x = <a> & <b>;\n";
    let markup = SyntectHighlighter::new()
        .highlight(text, Some("nosuchlanguage"))
        .expect("plain-text fallback succeeds");

    let runs = markup_to_runs(&markup, false, &DEFAULT_PALETTE);

    assert_eq!(concat(&runs), text);
    assert!(runs.iter().all(|r| r.color.is_none()));
}
