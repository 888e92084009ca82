//! Integration tests: plan info resolution and artifact checks over real HTTP.

mod common;

use common::http_server::{self, Route};
use plan_check::config::Config;
use plan_check::planinfo::{DownloadError, ValidationError};
use plan_check::utils::download::{FetchError, HttpTransport};
use plan_check::{check_plan_info, CheckError, ParseError, PlanInfo, ValidationMode, Verifier};
use std::time::Duration;
use tempfile::tempdir;

fn quiet_config() -> Config {
    Config {
        show_progress: false,
        timeout_secs: 5,
        connect_timeout_secs: 2,
        ..Config::default()
    }
}

#[test]
fn plan_info_url_and_artifacts_verify_end_to_end() {
    let archive = common::daemon_tar_gz("myd");
    let server = http_server::start(vec![
        ("/v2-linux.tgz", Route::Body(archive.clone())),
        ("/v2-darwin.tgz", Route::Body(archive)),
    ]);
    let doc = format!(
        r#"{{"binaries":{{"linux/amd64":"{}","darwin/arm64":"{}"}}}}"#,
        server.url("/v2-linux.tgz"),
        server.url("/v2-darwin.tgz")
    );
    let plan_server = http_server::start(vec![("/plan.json", Route::Body(doc.clone().into_bytes()))]);

    let transport = HttpTransport::new(&quiet_config()).unwrap();
    let from_url = PlanInfo::parse(&plan_server.url("/plan.json"), &transport).unwrap();
    assert_eq!(from_url, PlanInfo::parse(&doc, &transport).unwrap());

    let scratch_parent = tempdir().unwrap();
    let config = Config {
        scratch_parent: Some(scratch_parent.path().to_path_buf()),
        ..quiet_config()
    };
    let verifier = Verifier::from_config(&transport, &config);
    verifier.validate_full(&from_url, "myd").unwrap();

    assert_eq!(server.hits(), 2);
    assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
}

#[test]
fn missing_artifact_names_platform_and_status() {
    let server = http_server::start(vec![]);
    let transport = HttpTransport::new(&quiet_config()).unwrap();
    let doc = format!(
        r#"{{"binaries":{{"linux/amd64":"{}"}}}}"#,
        server.url("/gone.tgz")
    );

    let scratch_parent = tempdir().unwrap();
    let verifier =
        Verifier::new(&transport).scratch_parent(Some(scratch_parent.path().to_path_buf()));
    let err = check_plan_info(&doc, "myd", ValidationMode::Full, &verifier).unwrap_err();

    match err {
        CheckError::Validation(ValidationError::Artifact { platform, source }) => {
            assert_eq!(platform, "linux/amd64");
            assert!(matches!(
                source,
                DownloadError::Fetch(FetchError::Status { status: 404, .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
}

#[test]
fn basic_failures_make_no_requests() {
    let server = http_server::start(vec![("/v2.tgz", Route::Body(common::daemon_tar_gz("myd")))]);
    let transport = HttpTransport::new(&quiet_config()).unwrap();
    let verifier = Verifier::new(&transport);

    let doc = format!(
        r#"{{"binaries":{{"bogus-key":"{}"}}}}"#,
        server.url("/v2.tgz")
    );
    let err = check_plan_info(&doc, "myd", ValidationMode::Full, &verifier).unwrap_err();
    assert!(matches!(
        err,
        CheckError::Validation(ValidationError::InvalidPlatform { .. })
    ));

    let err = check_plan_info(r#"{"binaries":{}}"#, "myd", ValidationMode::Full, &verifier)
        .unwrap_err();
    assert_eq!(err.to_string(), "no \"binaries\" entries found");

    assert_eq!(server.hits(), 0);
}

#[test]
fn unreachable_plan_info_url_is_a_parse_error() {
    let server = http_server::start(vec![]);
    let transport = HttpTransport::new(&quiet_config()).unwrap();

    let err = PlanInfo::parse(&server.url("/plan.json"), &transport).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Fetch {
            source: FetchError::Status { status: 404, .. },
            ..
        }
    ));
}

#[test]
fn stalled_download_times_out_and_cleans_up() {
    let server = http_server::start(vec![("/slow.tgz", Route::Stall(Duration::from_secs(5)))]);
    let config = Config {
        timeout_secs: 1,
        ..quiet_config()
    };
    let transport = HttpTransport::new(&config).unwrap();

    let scratch_parent = tempdir().unwrap();
    let verifier =
        Verifier::new(&transport).scratch_parent(Some(scratch_parent.path().to_path_buf()));
    let plan = PlanInfo::parse(
        &format!(r#"{{"binaries":{{"any":"{}"}}}}"#, server.url("/slow.tgz")),
        &transport,
    )
    .unwrap();

    let err = verifier.validate_full(&plan, "myd").unwrap_err();
    assert!(matches!(
        err,
        ValidationError::Artifact {
            source: DownloadError::Fetch(_),
            ..
        }
    ));
    assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
}

#[test]
fn parallel_downloads_with_progress_bars() {
    let archive = common::daemon_tar_gz("myd");
    let server = http_server::start(vec![
        ("/a.tgz", Route::Body(archive.clone())),
        ("/b.tgz", Route::Body(archive.clone())),
        ("/c.tgz", Route::Body(archive)),
    ]);
    let config = Config {
        show_progress: true,
        concurrency: 3,
        ..quiet_config()
    };
    let transport = HttpTransport::new(&config).unwrap();
    let verifier = Verifier::from_config(&transport, &config);

    let doc = format!(
        r#"{{"binaries":{{"linux/amd64":"{}","darwin/arm64":"{}","any":"{}"}}}}"#,
        server.url("/a.tgz"),
        server.url("/b.tgz"),
        server.url("/c.tgz")
    );
    check_plan_info(&doc, "myd", ValidationMode::Full, &verifier).unwrap();
    assert_eq!(server.hits(), 3);
}
