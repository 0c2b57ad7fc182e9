//! BDD tests for the release discovery, download, and verification pipeline.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use stage3_installer::error::InstallerError;
use stage3_installer::fetch::{FetchError, RedirectFetcher};
use stage3_installer::pipeline::{PipelineContext, ReleasePipeline};
use stage3_installer::stage::VerifiedArchive;
use stage3_installer::test_utils::{
    ExpectedCall, StubExecutor, StubTransport, failure_output, index_page, success_output,
};
use url::Url;

const ROOT: &str = "https://mirror.test/releases/amd64/autobuilds/";
const PREFIX: &str = "stage3-amd64-hardened-openrc";

/// How the stub verifier should answer.
#[derive(Clone, Copy)]
enum Verifier {
    Accepts,
    Rejects,
}

#[derive(Default)]
struct PipelineWorld {
    _work: Option<tempfile::TempDir>,
    _target: Option<tempfile::TempDir>,
    context: Option<PipelineContext>,
    transport: StubTransport,
    latest: Option<String>,
    verifier: Option<Verifier>,
    result: Option<Result<VerifiedArchive, InstallerError>>,
}

impl PipelineWorld {
    fn context(&self) -> &PipelineContext {
        self.context.as_ref().expect("context set")
    }

    fn latest(&self) -> &str {
        self.latest.as_deref().expect("latest release set")
    }

    fn serve(&mut self, url: &str, body: String) {
        self.transport = std::mem::take(&mut self.transport).with_body(url, body);
    }

    fn error(&self) -> &InstallerError {
        match self.result.as_ref().expect("pipeline ran") {
            Err(err) => err,
            Ok(archive) => panic!("expected failure, got {archive}"),
        }
    }
}

fn archive_name(release: &str) -> String {
    format!("{PREFIX}-{release}.tar.xz")
}

fn utf8(temp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path")
}

#[fixture]
fn world() -> PipelineWorld {
    let work = tempfile::tempdir().expect("work dir");
    let target = tempfile::tempdir().expect("target dir");
    let mut context = PipelineContext::new(
        Url::parse(ROOT).expect("valid URL"),
        utf8(&work),
        utf8(&target),
    );
    context.quiet = true;
    PipelineWorld {
        _work: Some(work),
        _target: Some(target),
        context: Some(context),
        ..Default::default()
    }
}

#[given("a mirror listing releases \"{older}\" and \"{newer}\"")]
fn given_mirror_with_releases(world: &mut PipelineWorld, older: String, newer: String) {
    let older_href = format!("{older}/");
    let newer_href = format!("{newer}/");
    world.serve(
        ROOT,
        index_page(&["../", newer_href.as_str(), older_href.as_str()]),
    );
    world.latest = Some(newer);
}

#[given("a mirror listing no releases")]
fn given_mirror_without_releases(world: &mut PipelineWorld) {
    world.serve(ROOT, index_page(&["../", "current-stage3-amd64/", "README"]));
}

#[given("a mirror whose index redirects to itself")]
fn given_self_redirect(world: &mut PipelineWorld) {
    world.transport = std::mem::take(&mut world.transport).with_redirect(ROOT, 302, ROOT);
}

#[given("the latest release holds an archive and its signature")]
fn given_archive_and_signature(world: &mut PipelineWorld) {
    let folder = format!("{ROOT}{}/", world.latest());
    let archive = archive_name(world.latest());
    let signature = format!("{archive}.asc");
    world.serve(
        &folder,
        index_page(&["../", archive.as_str(), signature.as_str()]),
    );
    world.serve(&format!("{folder}{archive}"), "archive".to_owned());
    world.serve(&format!("{folder}{signature}"), "signature".to_owned());
}

#[given("the latest release holds only an archive")]
fn given_archive_only(world: &mut PipelineWorld) {
    let folder = format!("{ROOT}{}/", world.latest());
    let archive = archive_name(world.latest());
    world.serve(&folder, index_page(&["../", archive.as_str()]));
    world.serve(&format!("{folder}{archive}"), "archive".to_owned());
}

#[given("the verifier accepts the signature")]
fn given_verifier_accepts(world: &mut PipelineWorld) {
    world.verifier = Some(Verifier::Accepts);
}

#[given("the verifier rejects the signature")]
fn given_verifier_rejects(world: &mut PipelineWorld) {
    world.verifier = Some(Verifier::Rejects);
}

#[when("the pipeline runs")]
fn when_pipeline_runs(world: &mut PipelineWorld) {
    let context = world.context();
    let expected = match (world.verifier, world.latest.as_deref()) {
        (Some(answer), Some(latest)) => {
            let signature = context.work_dir.join(format!("{}.asc", archive_name(latest)));
            let output = match answer {
                Verifier::Accepts => success_output(),
                Verifier::Rejects => failure_output("gpg: BAD signature"),
            };
            vec![ExpectedCall::new(
                "gpg",
                &["--verify", signature.as_str()],
                Ok(output),
            )]
        }
        _ => Vec::new(),
    };
    let executor = StubExecutor::new(expected);
    let fetcher = RedirectFetcher::new(&world.transport);
    let mut pipeline = ReleasePipeline::new(context, &fetcher, &executor);

    let mut stderr = Vec::new();
    let result = pipeline.run(&mut stderr);
    world.result = Some(result);
}

#[then("the archive from \"{release}\" is placed in the target directory")]
fn then_archive_placed(world: &mut PipelineWorld, release: String) {
    let archive = match world.result.as_ref().expect("pipeline ran") {
        Ok(archive) => archive,
        Err(err) => panic!("expected success, got {err}"),
    };
    let expected = world.context().target_dir.join(archive_name(&release));
    assert_eq!(archive.path(), expected);
    assert!(expected.exists(), "archive missing at {expected}");
}

#[then("the signature is removed from the working directory")]
fn then_signature_removed(world: &mut PipelineWorld) {
    let signature = world
        .context()
        .work_dir
        .join(format!("{}.asc", archive_name(world.latest())));
    assert!(!signature.exists(), "signature still present: {signature}");
}

#[then("the run fails with a verification error")]
fn then_verification_error(world: &mut PipelineWorld) {
    let err = world.error();
    assert!(
        matches!(err, InstallerError::VerificationFailed { .. }),
        "expected VerificationFailed, got {err:?}"
    );
}

#[then("the run fails because no signature was found")]
fn then_no_signature(world: &mut PipelineWorld) {
    let err = world.error();
    assert!(
        matches!(err, InstallerError::NoSignatureFound),
        "expected NoSignatureFound, got {err:?}"
    );
}

#[then("the run fails because no releases were found")]
fn then_no_releases(world: &mut PipelineWorld) {
    let err = world.error();
    assert!(
        matches!(err, InstallerError::NoReleasesFound { .. }),
        "expected NoReleasesFound, got {err:?}"
    );
}

#[then("the run fails with a redirect loop")]
fn then_redirect_loop(world: &mut PipelineWorld) {
    let err = world.error();
    assert!(
        matches!(
            err,
            InstallerError::IndexFetch(FetchError::RedirectLoop { .. })
        ),
        "expected RedirectLoop, got {err:?}"
    );
}

#[then("the target directory is empty")]
fn then_target_empty(world: &mut PipelineWorld) {
    let target = &world.context().target_dir;
    let entries: Vec<_> = std::fs::read_dir(target)
        .expect("read target dir")
        .collect();
    assert!(entries.is_empty(), "target directory not empty: {entries:?}");
}

#[scenario(
    path = "tests/features/release_pipeline.feature",
    name = "Latest release is verified and staged"
)]
fn scenario_latest_release_staged(world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_pipeline.feature",
    name = "Rejected signature leaves the target untouched"
)]
fn scenario_rejected_signature(world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_pipeline.feature",
    name = "Release without a signature is refused"
)]
fn scenario_missing_signature(world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_pipeline.feature",
    name = "Mirror without releases"
)]
fn scenario_no_releases(world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release_pipeline.feature",
    name = "Index that redirects to itself"
)]
fn scenario_redirect_loop(world: PipelineWorld) {
    let _ = world;
}
