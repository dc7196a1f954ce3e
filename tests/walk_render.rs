use std::fs;
use std::path::Path;

use repoprint::assemble::Assembler;
use repoprint::config::{RenderOptions, RunConfig, SourceSpec};
use repoprint::contract::{RenderedContent, TextRun};
use repoprint::download::GitAcquirer;
use repoprint::highlight::SyntectHighlighter;
use repoprint::preprocess::PassthroughReformatter;
use repoprint::progress::NoopProgress;
use repoprint::render::{render, Collaborators, RenderError};
use tempfile::tempdir;

fn assert_pdf_magic(path: &Path) {
    let bytes = fs::read(path).expect("document exists on disk");
    assert!(
        bytes.len() > 100,
        "output PDF is too small and may not exist"
    );
    assert_eq!(&bytes[0..4], b"%PDF", "PDF file missing magic header");
}

fn local_config(root: &Path, output: &Path, options: RenderOptions) -> RunConfig {
    RunConfig {
        source: SourceSpec::Local {
            path: root.to_path_buf(),
        },
        output: output.to_path_buf(),
        options,
        subpath: None,
    }
}

async fn run_render(config: &RunConfig) -> Result<repoprint::contract::RunReport, RenderError> {
    let acquirer = GitAcquirer::new();
    let reformatter = PassthroughReformatter;
    let highlighter = SyntectHighlighter::new();
    let progress = NoopProgress;
    let collab = Collaborators {
        acquirer: &acquirer,
        reformatter: &reformatter,
        highlighter: &highlighter,
        progress: &progress,
    };
    render(config, &collab).await
}

fn write_sample_tree(root: &Path) {
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/main.rs"), "fn main() {\n    run();\n}\n").unwrap();
    fs::write(root.join("README.md"), "# sample\n").unwrap();
}

#[tokio::test]
async fn single_document_run_counts_files_and_writes_pdf() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());

    let output = out.path().join("output.pdf");
    let config = local_config(source.path(), &output, RenderOptions::default());

    let report = run_render(&config).await.expect("render succeeds");

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.documents_produced, 1);
    assert_pdf_magic(&output);
}

#[tokio::test]
async fn ignore_descriptor_excludes_files_from_the_count() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());
    fs::write(source.path().join("debug.log"), "noise\n").unwrap();
    fs::write(
        source.path().join("repoprint.ignore"),
        r#"{"ignoredExtensions": [".log"]}"#,
    )
    .unwrap();

    let output = out.path().join("output.pdf");
    let config = local_config(source.path(), &output, RenderOptions::default());

    let report = run_render(&config).await.expect("render succeeds");

    // main.rs and README.md; debug.log and the descriptor itself are skipped.
    assert_eq!(report.files_processed, 2);
}

#[tokio::test]
async fn built_in_excludes_skip_directories_entirely() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());
    fs::create_dir_all(source.path().join("node_modules/dep")).unwrap();
    fs::write(source.path().join("node_modules/dep/index.js"), "x\n").unwrap();
    fs::write(source.path().join("logo.png"), [0u8, 1, 2]).unwrap();

    let output = out.path().join("output.pdf");
    let config = local_config(source.path(), &output, RenderOptions::default());

    let report = run_render(&config).await.expect("render succeeds");

    assert_eq!(report.files_processed, 2);
}

#[tokio::test]
async fn subpath_restricted_to_one_file_renders_exactly_that_file() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());

    let output = out.path().join("output.pdf");
    let mut config = local_config(source.path(), &output, RenderOptions::default());
    config.subpath = Some("src/main.rs".into());

    let report = run_render(&config).await.expect("render succeeds");

    assert_eq!(report.files_processed, 1);
    assert_pdf_magic(&output);
}

#[tokio::test]
async fn subpath_restricted_to_a_directory_walks_only_that_subtree() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());

    let output = out.path().join("output.pdf");
    let mut config = local_config(source.path(), &output, RenderOptions::default());
    config.subpath = Some("src".into());

    let report = run_render(&config).await.expect("render succeeds");

    // Only src/main.rs; README.md is a sibling of the subtree.
    assert_eq!(report.files_processed, 1);
}

#[tokio::test]
async fn missing_subpath_is_a_fatal_error() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());

    let output = out.path().join("output.pdf");
    let mut config = local_config(source.path(), &output, RenderOptions::default());
    config.subpath = Some("does/not/exist".into());

    let err = run_render(&config).await.unwrap_err();

    assert!(matches!(err, RenderError::MissingSubPath(_)));
    assert!(!output.exists(), "no partial artifact may be produced");
}

#[tokio::test]
async fn missing_local_source_is_a_fatal_error() {
    let out = tempdir().unwrap();
    let config = RunConfig {
        source: SourceSpec::Local {
            path: "/definitely/not/a/real/tree".into(),
        },
        output: out.path().join("output.pdf"),
        options: RenderOptions::default(),
        subpath: None,
    };

    let err = run_render(&config).await.unwrap_err();

    assert!(matches!(err, RenderError::Acquire(_)));
}

#[tokio::test]
async fn per_file_mode_produces_independent_documents() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::create_dir_all(source.path().join("a")).unwrap();
    fs::write(source.path().join("a/b.ts"), "const b = 1;\n").unwrap();
    fs::write(source.path().join("a/c.ts"), "const c = 2;\n").unwrap();

    let options = RenderOptions {
        one_pdf_per_file: true,
        ..RenderOptions::default()
    };
    let out_dir = out.path().join("docs");
    let config = local_config(source.path(), &out_dir, options);

    let report = run_render(&config).await.expect("render succeeds");

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.documents_produced, 2);
    assert_pdf_magic(&out_dir.join("a_b.ts.pdf"));
    assert_pdf_magic(&out_dir.join("a_c.ts.pdf"));
}

#[tokio::test]
async fn invalid_options_fail_before_any_output() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());

    let output = out.path().join("output.pdf");
    let options = RenderOptions {
        tab_width: 99,
        ..RenderOptions::default()
    };
    let config = local_config(source.path(), &output, options);

    let err = run_render(&config).await.unwrap_err();

    assert!(matches!(err, RenderError::Options(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn binary_files_are_embedded_rather_than_skipped() {
    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(source.path().join("blob.bin"), [0u8, 159, 146, 150]).unwrap();

    let output = out.path().join("output.pdf");
    let config = local_config(source.path(), &output, RenderOptions::default());

    let report = run_render(&config).await.expect("render succeeds");

    assert_eq!(report.files_processed, 1);
    assert_pdf_magic(&output);
}

#[tokio::test]
async fn excluded_entries_never_reach_the_text_pipeline() {
    use repoprint::contract::MockHighlighter;
    use repoprint::highlight::plaintext_markup;

    let source = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_sample_tree(source.path());
    fs::write(source.path().join("debug.log"), "never read\n").unwrap();
    fs::write(
        source.path().join("repoprint.ignore"),
        r#"{"ignoredExtensions": [".log"]}"#,
    )
    .unwrap();

    // The highlighter sits behind the text pipeline, so the call count
    // proves how many files were actually processed.
    let mut highlighter = MockHighlighter::new();
    highlighter
        .expect_highlight()
        .times(2)
        .returning(|text, _| Ok(plaintext_markup(text)));

    let output = out.path().join("output.pdf");
    let config = local_config(source.path(), &output, RenderOptions::default());

    let acquirer = GitAcquirer::new();
    let reformatter = PassthroughReformatter;
    let progress = NoopProgress;
    let collab = Collaborators {
        acquirer: &acquirer,
        reformatter: &reformatter,
        highlighter: &highlighter,
        progress: &progress,
    };
    let report = render(&config, &collab).await.expect("render succeeds");

    assert_eq!(report.files_processed, 2);
}

#[tokio::test]
async fn single_document_accumulates_one_page_break_per_file() {
    let out = tempdir().unwrap();
    let target = out.path().join("pages.pdf");
    let mut assembler =
        Assembler::open_single(&target, RenderOptions::default()).expect("assembler opens");

    let runs = vec![
        TextRun::text("fn main() {}", None),
        TextRun::newline(),
    ];
    assembler
        .add_file(Path::new("one.rs"), RenderedContent::Text(runs.clone()))
        .unwrap();
    assembler
        .add_file(Path::new("two.rs"), RenderedContent::Text(runs))
        .unwrap();

    // One page from open, one page break ahead of the second file.
    assert_eq!(assembler.page_count(), 2);

    let documents = assembler.finish().await.expect("finish succeeds");
    assert_eq!(documents, 1);
    assert_pdf_magic(&target);
}
