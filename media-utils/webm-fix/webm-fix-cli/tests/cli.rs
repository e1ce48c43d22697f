use std::{
    cell::RefCell,
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
    rc::Rc,
};

use clap::Parser;
use test_log::test;

use webm_fix::{Metadata, StatusCode, WebmRepairer};
use webm_fix_cli::{Backend, Cli, format_invocation, run};

/// Records every call and returns a fixed status.
struct Recorder {
    calls: RefCell<Vec<(PathBuf, PathBuf, Metadata)>>,
    status: StatusCode,
    output: Option<&'static [u8]>,
}

impl Recorder {
    fn returning(code: i32) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            status: StatusCode(code),
            output: None,
        }
    }
}

impl WebmRepairer for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn repair(
        &self,
        source: &Path,
        destination: &Path,
        metadata: &Metadata,
    ) -> webm_fix::Result<StatusCode> {
        self.calls.borrow_mut().push((
            source.to_path_buf(),
            destination.to_path_buf(),
            metadata.clone(),
        ));
        if let Some(buf) = self.output {
            std::fs::write(destination, buf)?;
        }
        Ok(self.status)
    }
}

struct Scratch {
    _dir: tempfile::TempDir,
    src: PathBuf,
    dst: PathBuf,
}

fn scratch() -> Scratch {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("in.webm");
    let dst = dir.path().join("out.webm");
    std::fs::write(&src, b"recording").unwrap();
    Scratch {
        _dir: dir,
        src,
        dst,
    }
}

fn stdout_lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn echoes_calls_once_and_prints_code() {
    let s = scratch();
    let argv: Vec<OsString> = vec!["fix".into(), s.src.clone().into(), s.dst.clone().into()];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let recorder = Recorder::returning(12);
    let mut out = Vec::new();

    let result = run(&argv, &cli, &mut out, |_| Ok(&recorder));

    // A non-zero status is a failure for the process, but is still printed.
    assert!(result.is_err());
    assert_eq!(
        stdout_lines(&out),
        vec![
            format!("[fix {} {}]", s.src.display(), s.dst.display()),
            "12".to_string(),
        ]
    );
    let calls = recorder.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, s.src);
    assert_eq!(calls[0].1, s.dst);
    assert!(calls[0].2.is_empty());
}

#[test]
fn zero_status_succeeds() {
    let s = scratch();
    let argv: Vec<OsString> = vec!["fix".into(), s.src.clone().into(), s.dst.clone().into()];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let recorder = Recorder::returning(0);
    let mut out = Vec::new();

    let status = run(&argv, &cli, &mut out, |_| Ok(&recorder)).unwrap();

    assert_eq!(status, StatusCode::SUCCESS);
    assert_eq!(stdout_lines(&out)[1], "0");
    assert_eq!(recorder.calls.borrow().len(), 1);
}

/// Stdout that a repairer can look at while it runs.
#[derive(Clone, Default)]
struct SharedOut(Rc<RefCell<Vec<u8>>>);

impl Write for SharedOut {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct Peeker {
    out: SharedOut,
    seen: RefCell<Option<String>>,
}

impl WebmRepairer for Peeker {
    fn name(&self) -> &str {
        "peeker"
    }

    fn repair(&self, _: &Path, _: &Path, _: &Metadata) -> webm_fix::Result<StatusCode> {
        let printed = String::from_utf8(self.out.0.borrow().clone()).unwrap();
        *self.seen.borrow_mut() = Some(printed);
        Ok(StatusCode(3))
    }
}

#[test]
fn echo_comes_before_the_repair() {
    let s = scratch();
    let argv: Vec<OsString> = vec!["fix".into(), s.src.clone().into(), s.dst.clone().into()];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let mut out = SharedOut::default();
    let peeker = Peeker {
        out: out.clone(),
        seen: RefCell::new(None),
    };

    run(&argv, &cli, &mut out, |_| Ok(&peeker)).unwrap_err();

    let echo = format!("{}\n", format_invocation(&argv));
    assert_eq!(peeker.seen.borrow().as_deref(), Some(echo.as_str()));
    assert_eq!(*out.0.borrow(), format!("{echo}3\n").into_bytes());
}

#[test]
fn missing_destination_is_a_usage_error() {
    let err = Cli::try_parse_from(["fix", "in.webm"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    let err = Cli::try_parse_from(["fix"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn missing_source_never_calls() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("missing.webm");
    let dst = dir.path().join("out.webm");
    let argv: Vec<OsString> = vec!["fix".into(), src.into(), dst.into()];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let recorder = Recorder::returning(0);
    let mut out = Vec::new();

    let err = run(&argv, &cli, &mut out, |_| Ok(&recorder)).unwrap_err();

    assert!(format!("{err:?}").contains("does not exist"), "{err:?}");
    assert!(recorder.calls.borrow().is_empty());
    assert_eq!(stdout_lines(&out).len(), 1);
}

#[test]
fn metadata_flags_reach_the_repairer() {
    let s = scratch();
    let argv: Vec<OsString> = vec![
        "fix".into(),
        s.src.clone().into(),
        s.dst.clone().into(),
        "-m".into(),
        "title=XXXX".into(),
        "--metadata".into(),
        "comment=a=b".into(),
    ];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let recorder = Recorder::returning(0);
    let mut out = Vec::new();

    run(&argv, &cli, &mut out, |_| Ok(&recorder)).unwrap();

    let calls = recorder.calls.borrow();
    assert_eq!(calls[0].2.get("title"), Some("XXXX"));
    assert_eq!(calls[0].2.get("comment"), Some("a=b"));
}

#[test]
fn malformed_metadata_is_a_usage_error() {
    let err = Cli::try_parse_from(["fix", "a.webm", "b.webm", "-m", "novalue"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn backend_selection() {
    let cli = Cli::try_parse_from(["fix", "a.webm", "b.webm"]).unwrap();
    assert_eq!(cli.backend, Backend::Native);

    let cli = Cli::try_parse_from([
        "fix",
        "a.webm",
        "b.webm",
        "--backend",
        "ffmpeg",
        "--ffmpeg",
        "/opt/ffmpeg/bin/ffmpeg",
    ])
    .unwrap();
    assert_eq!(cli.backend, Backend::Ffmpeg);
    let repairer = cli.build_repairer().unwrap();
    assert_eq!(repairer.name(), "ffmpeg");
}

#[test]
fn unloadable_library_fails_after_echo() {
    let s = scratch();
    let argv: Vec<OsString> = vec![
        "fix".into(),
        s.src.clone().into(),
        s.dst.clone().into(),
        "--library".into(),
        "/nonexistent/dir/libwebm-missing.so".into(),
    ];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let mut out = Vec::new();

    let err = run(&argv, &cli, &mut out, Cli::build_repairer).unwrap_err();

    assert!(format!("{err:?}").contains("native repair library"), "{err:?}");
    assert_eq!(stdout_lines(&out), vec![format_invocation(&argv)]);
}

#[test]
fn verify_rejects_unreadable_output() {
    let s = scratch();
    let argv: Vec<OsString> = vec![
        "fix".into(),
        s.src.clone().into(),
        s.dst.clone().into(),
        "--verify".into(),
    ];
    let cli = Cli::try_parse_from(&argv).unwrap();
    let recorder = Recorder {
        output: Some(&b"this is not a webm file"[..]),
        ..Recorder::returning(0)
    };
    let mut out = Vec::new();

    let err = run(&argv, &cli, &mut out, |_| Ok(&recorder)).unwrap_err();

    assert!(format!("{err:?}").contains("while verifying"), "{err:?}");
    assert_eq!(stdout_lines(&out)[1], "0");
}

#[test]
fn invocation_format() {
    assert_eq!(
        format_invocation(["fix", "in.webm", "out.webm"]),
        "[fix in.webm out.webm]"
    );
    assert_eq!(format_invocation(Vec::<String>::new()), "[]");
}
