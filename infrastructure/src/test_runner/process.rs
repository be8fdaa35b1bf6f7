//! Process-based test runner

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Component, Path};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};
use weaver_application::{TestRunner, TestRunnerError};
use weaver_domain::util::truncate_str;
use weaver_domain::{GENERATED_CRATE_NAME, GeneratedCode, TestRun};

/// Maximum combined output kept from one run (256KB)
const MAX_OUTPUT_SIZE: usize = 256 * 1024;

/// Markers that identify a failure line in test output
const FAILURE_MARKERS: [&str; 4] = ["FAILED", "panicked", "AssertionError", "error:"];

/// Output of a failed run that never reached the test suite
const SETUP_FAILURE_MARKERS: [&str; 5] = [
    "could not find `Cargo.toml`",
    "failed to parse manifest",
    "error: no such command",
    "No module named pytest",
    "command not found",
];

/// Runs the configured test command against generated code.
///
/// Every run gets a fresh [`TempDir`]; it is removed before `run` returns,
/// whatever the outcome.
#[derive(Debug, Clone)]
pub struct ProcessTestRunner {
    program: String,
    args: Vec<String>,
    code_file: String,
    test_file: String,
    timeout: Duration,
}

impl ProcessTestRunner {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            code_file: "src/lib.rs".to_string(),
            test_file: "tests/generated.rs".to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Where unnamed code and test blocks are written
    pub fn with_files(mut self, code_file: impl Into<String>, test_file: impl Into<String>) -> Self {
        self.code_file = code_file.into();
        self.test_file = test_file.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Write code then tests; unnamed blocks are concatenated into the fallback file.
    ///
    /// A cargo run without a generated `Cargo.toml` gets a minimal manifest.
    fn prepare(
        &self,
        dir: &Path,
        code: &GeneratedCode,
        tests: &GeneratedCode,
    ) -> Result<(), TestRunnerError> {
        write_files(dir, code, &self.code_file)?;
        write_files(dir, tests, &self.test_file)?;

        if self.uses_cargo() && !dir.join("Cargo.toml").exists() {
            let lib_path = Some(self.code_file.as_str())
                .filter(|p| p.ends_with(".rs") && dir.join(p).is_file());
            debug!("Writing default Cargo.toml (lib: {:?})", lib_path);
            write_one(dir, "Cargo.toml", &cargo_manifest(lib_path)?)?;
        }
        Ok(())
    }

    fn uses_cargo(&self) -> bool {
        Path::new(&self.program)
            .file_stem()
            .is_some_and(|stem| stem == "cargo")
    }

    async fn execute(&self, dir: &Path) -> Result<TestRun, TestRunnerError> {
        let start = Instant::now();
        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TestRunnerError::Spawn(format!("{}: {}", self.program, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TestRunnerError::Timeout(self.timeout))?
            .map_err(|e| TestRunnerError::Other(format!("failed to collect output: {}", e)))?;

        let combined = combine_output(&output.stdout, &output.stderr);
        info!(
            passed = output.status.success(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Test command finished"
        );

        if output.status.success() {
            Ok(TestRun::passed(combined))
        } else if let Some(line) = setup_failure(&combined) {
            Err(TestRunnerError::SuiteNotStarted(line))
        } else {
            let mut failures = extract_failures(&combined);
            if failures.is_empty() {
                failures.push(format!("test command exited with {}", output.status));
            }
            Ok(TestRun::failed(combined, failures))
        }
    }
}

#[async_trait]
impl TestRunner for ProcessTestRunner {
    async fn run(
        &self,
        code: &GeneratedCode,
        tests: &GeneratedCode,
    ) -> Result<TestRun, TestRunnerError> {
        let dir = TempDir::with_prefix("weaver-run-")
            .map_err(|e| TestRunnerError::Workspace(e.to_string()))?;
        debug!("Running tests in {:?}", dir.path());

        self.prepare(dir.path(), code, tests)?;
        let result = self.execute(dir.path()).await;

        dir.close()
            .map_err(|e| TestRunnerError::Workspace(format!("cleanup failed: {}", e)))?;
        result
    }
}

#[derive(Serialize)]
struct CargoManifest<'a> {
    package: CargoPackage<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lib: Option<CargoLib<'a>>,
    /// Empty table: keeps cargo from attaching the run to an enclosing workspace
    workspace: toml::Table,
}

#[derive(Serialize)]
struct CargoPackage<'a> {
    name: &'a str,
    version: &'a str,
    edition: &'a str,
}

#[derive(Serialize)]
struct CargoLib<'a> {
    path: &'a str,
}

fn cargo_manifest(lib_path: Option<&str>) -> Result<String, TestRunnerError> {
    let manifest = CargoManifest {
        package: CargoPackage {
            name: GENERATED_CRATE_NAME,
            version: "0.1.0",
            edition: "2021",
        },
        lib: lib_path.map(|path| CargoLib { path }),
        workspace: toml::Table::new(),
    };
    toml::to_string(&manifest)
        .map_err(|e| TestRunnerError::Workspace(format!("Cargo.toml: {}", e)))
}

/// First output line showing the suite never started
fn setup_failure(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| SETUP_FAILURE_MARKERS.iter().any(|m| line.contains(m)))
        .map(str::to_string)
}

/// Blocks without an agent-chosen file name
fn is_unnamed(path: &str) -> bool {
    path == "generated.txt" || path.starts_with("snippet_")
}

/// Reject paths that would escape the workspace
fn safe_relative(path: &str) -> Result<&Path, TestRunnerError> {
    let p = Path::new(path);
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.is_empty() {
        return Err(TestRunnerError::Workspace(format!(
            "refusing to write outside the workspace: {}",
            path
        )));
    }
    Ok(p)
}

fn write_files(dir: &Path, code: &GeneratedCode, fallback: &str) -> Result<(), TestRunnerError> {
    let mut unnamed = Vec::new();
    for change in code.changes() {
        if is_unnamed(&change.path) {
            unnamed.push(change.content.as_str());
        } else {
            write_one(dir, &change.path, &change.content)?;
        }
    }
    if !unnamed.is_empty() {
        write_one(dir, fallback, &unnamed.join("\n\n"))?;
    }
    Ok(())
}

fn write_one(dir: &Path, path: &str, content: &str) -> Result<(), TestRunnerError> {
    let target = dir.join(safe_relative(path)?);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| TestRunnerError::Workspace(format!("{}: {}", path, e)))?;
    }
    let mut body = content.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    std::fs::write(&target, body).map_err(|e| TestRunnerError::Workspace(format!("{}: {}", path, e)))
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let mut combined = stdout.into_owned();
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(&stderr);
    }

    if combined.len() > MAX_OUTPUT_SIZE {
        let mut truncated = truncate_str(&combined, MAX_OUTPUT_SIZE).to_string();
        truncated.push_str("\n... (output truncated)");
        return truncated;
    }
    combined
}

/// Lines of test output that name a failure, trimmed and de-duplicated.
pub fn extract_failures(output: &str) -> Vec<String> {
    let mut failures: Vec<String> = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if FAILURE_MARKERS.iter().any(|m| line.contains(m))
            && !failures.iter().any(|f| f == line)
        {
            failures.push(line.to_string());
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileTestRunnerConfig;
    use weaver_domain::CodeChange;

    fn sh(script: &str) -> ProcessTestRunner {
        ProcessTestRunner::new("sh", ["-c", script]).with_files("code.txt", "test.txt")
    }

    fn code(path: &str, content: &str) -> GeneratedCode {
        GeneratedCode::new([CodeChange::new(path, content)])
    }

    #[test]
    fn test_extract_failures() {
        let output = "\
running 2 tests
test tests::add ... FAILED
thread 'tests::add' panicked at src/lib.rs:4:5
test tests::add ... FAILED
E   AssertionError: 3 != 4
error: test failed, to rerun pass `--lib`
test result: ok";
        assert_eq!(
            extract_failures(output),
            vec![
                "test tests::add ... FAILED",
                "thread 'tests::add' panicked at src/lib.rs:4:5",
                "E   AssertionError: 3 != 4",
                "error: test failed, to rerun pass `--lib`",
            ]
        );
        assert!(extract_failures("all good").is_empty());
    }

    #[test]
    fn test_combine_output() {
        assert_eq!(combine_output(b"out", b""), "out");
        assert_eq!(combine_output(b"", b"err"), "err");
        assert_eq!(combine_output(b"out", b"err"), "out\n--- stderr ---\nerr");
    }

    #[test]
    fn test_unsafe_paths_rejected() {
        assert!(safe_relative("src/lib.rs").is_ok());
        assert!(safe_relative("../escape.rs").is_err());
        assert!(safe_relative("/etc/passwd").is_err());
        assert!(safe_relative("").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_passing_run_sees_files() {
        let runner = sh("test -f src/util.rs && grep -q assert test.txt && echo ok");
        let run = runner
            .run(&code("src/util.rs", "fn f() {}"), &code("snippet_1.rs", "assert f()"))
            .await
            .unwrap();
        assert!(run.passed);
        assert_eq!(run.output.trim(), "ok");
        assert!(run.failures.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unnamed_code_goes_to_code_file() {
        let runner = sh("cat code.txt");
        let code = GeneratedCode::new([
            CodeChange::new("snippet_1.py", "a = 1"),
            CodeChange::new("snippet_2.py", "b = 2"),
        ]);
        let run = runner.run(&code, &GeneratedCode::default()).await.unwrap();
        assert_eq!(run.output, "a = 1\n\nb = 2\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_run_extracts_failures() {
        let runner = sh("echo 'test add ... FAILED'; echo 'error: 1 failed' >&2; exit 101");
        let run = runner
            .run(&GeneratedCode::default(), &GeneratedCode::default())
            .await
            .unwrap();
        assert!(!run.passed);
        assert_eq!(run.failures, vec!["test add ... FAILED", "error: 1 failed"]);
        assert!(run.output.contains("--- stderr ---"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_run_without_markers() {
        let run = sh("exit 2")
            .run(&GeneratedCode::default(), &GeneratedCode::default())
            .await
            .unwrap();
        assert!(!run.passed);
        assert_eq!(run.failures.len(), 1);
        assert!(run.failures[0].starts_with("test command exited with"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_tooling_error() {
        let runner = sh("sleep 5").with_timeout(Duration::from_millis(100));
        let err = runner
            .run(&GeneratedCode::default(), &GeneratedCode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TestRunnerError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_tooling_error() {
        let runner = ProcessTestRunner::new("weaver-no-such-test-binary", Vec::<String>::new());
        let err = runner
            .run(&GeneratedCode::default(), &GeneratedCode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TestRunnerError::Spawn(_)));
    }

    #[test]
    fn test_cargo_run_gets_default_manifest() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessTestRunner::new("cargo", ["test"]);
        runner
            .prepare(
                dir.path(),
                &code("snippet_1.rs", "pub fn one() -> u32 { 1 }"),
                &GeneratedCode::default(),
            )
            .unwrap();

        let manifest: toml::Table =
            toml::from_str(&std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap())
                .unwrap();
        assert_eq!(manifest["package"]["name"].as_str(), Some(GENERATED_CRATE_NAME));
        assert_eq!(manifest["lib"]["path"].as_str(), Some("src/lib.rs"));
        assert!(manifest["workspace"].as_table().unwrap().is_empty());
    }

    #[test]
    fn test_generated_manifest_is_kept() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessTestRunner::new("/usr/local/bin/cargo", ["test"]);
        let generated = "[package]\nname = \"mine\"";
        runner
            .prepare(
                dir.path(),
                &GeneratedCode::new([
                    CodeChange::new("Cargo.toml", generated),
                    CodeChange::new("src/lib.rs", ""),
                ]),
                &GeneratedCode::default(),
            )
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap(),
            format!("{}\n", generated)
        );
    }

    #[test]
    fn test_other_commands_get_no_manifest() {
        let dir = TempDir::new().unwrap();
        sh("true")
            .prepare(dir.path(), &code("lib.rs", "x"), &GeneratedCode::default())
            .unwrap();
        assert!(!dir.path().join("Cargo.toml").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_suite_that_never_starts_is_tooling_error() {
        let runner = sh(
            "echo 'error: could not find `Cargo.toml` in `/tmp/x` or any parent directory' >&2; exit 101",
        );
        let err = runner
            .run(&GeneratedCode::default(), &GeneratedCode::default())
            .await
            .unwrap_err();
        match err {
            TestRunnerError::SuiteNotStarted(line) => {
                assert!(line.starts_with("error: could not find `Cargo.toml`"))
            }
            other => panic!("expected SuiteNotStarted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_default_config_builds_and_tests_generated_crate() {
        let runner = FileTestRunnerConfig::default().to_runner();
        let code = GeneratedCode::from_response(
            "```rust src/lib.rs\npub fn add(a: u32, b: u32) -> u32 {\n    a + b\n}\n```",
        );
        let tests = |expected: u32| {
            GeneratedCode::from_response(&format!(
                "```rust tests/generated.rs\nuse weaver_generated::add;\n\n#[test]\nfn adds() {{\n    assert_eq!(add(2, 2), {});\n}}\n```",
                expected
            ))
        };

        let run = runner.run(&code, &tests(4)).await.unwrap();
        assert!(run.passed, "{}", run.output);
        assert!(run.failures.is_empty());

        let run = runner.run(&code, &tests(5)).await.unwrap();
        assert!(!run.passed);
        assert!(!run.failures.is_empty());
    }

    #[tokio::test]
    async fn test_escaping_path_is_tooling_error() {
        let err = sh("true")
            .run(&code("../evil.rs", "x"), &GeneratedCode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TestRunnerError::Workspace(_)));
    }
}
