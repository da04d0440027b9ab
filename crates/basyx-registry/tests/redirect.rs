use basyx_registry::{
    EndpointResolver, NetworkProbe, PingProbe, RedirectError, Redirector, ResolverConfig,
    ShellDescriptor, TcpProbe,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

fn registry(descriptors: serde_json::Value) -> HashMap<String, ShellDescriptor> {
    let descriptors: Vec<ShellDescriptor> = serde_json::from_value(descriptors).unwrap();
    descriptors
        .into_iter()
        .map(|d| (d.id.clone(), d))
        .collect()
}

fn config() -> ResolverConfig {
    ResolverConfig {
        probe_timeout: Duration::from_secs(1),
        ..ResolverConfig::default()
    }
}

#[tokio::test]
async fn redirects_to_first_listening_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // TEST-NET-1 is never routable, so the first endpoint fails.
    let source = registry(serde_json::json!([{
        "id": "urn:basyx:shell:press-3",
        "endpoints": [
            {"interface": "AAS-3.0", "protocolInformation": {"href": "http://192.0.2.1/shells/cHJlc3M/aas"}},
            {"interface": "AAS-3.0", "protocolInformation": {"href": format!("http://127.0.0.1:{port}/shells/cHJlc3M/aas")}}
        ],
        "submodelDescriptors": [
            {"id": "urn:basyx:sm:operational", "endpoints": [
                {"interface": "SUBMODEL-3.0", "protocolInformation": {"href": format!("http://127.0.0.1:{port}/submodels/b3A/aas")}}
            ]}
        ]
    }]));

    let redirector = Redirector::new(source, EndpointResolver::new(TcpProbe::new(port), config()));

    let url = redirector
        .redirect("urn:basyx:shell:press-3", "submodels")
        .await
        .unwrap();
    assert_eq!(url.as_str(), format!("http://127.0.0.1:{port}/shells/cHJlc3M/submodels"));

    let url = redirector
        .redirect_submodel("urn:basyx:shell:press-3", "urn:basyx:sm:operational", "$value")
        .await
        .unwrap();
    assert_eq!(url.as_str(), format!("http://127.0.0.1:{port}/submodels/b3A/$value"));
}

#[tokio::test]
async fn unknown_shell_and_submodel() {
    let source = registry(serde_json::json!([{"id": "urn:basyx:shell:1"}]));
    let redirector = Redirector::new(source, EndpointResolver::new(TcpProbe::new(1), config()));

    let err = redirector.redirect("urn:other", "submodels").await.unwrap_err();
    assert_eq!(err, RedirectError::ShellNotFound("urn:other".into()));
    assert_eq!(err.status_code(), 404);

    let err = redirector
        .redirect_submodel("urn:basyx:shell:1", "urn:sm:missing", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::SubmodelNotFound { .. }));

    let err = redirector.redirect("", "submodels").await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn shell_without_reachable_endpoint() {
    let source = registry(serde_json::json!([{
        "id": "urn:basyx:shell:offline",
        "endpoints": [
            {"interface": "AAS-3.0", "protocolInformation": {"href": "http://192.0.2.1/aas"}}
        ]
    }]));
    let resolver = EndpointResolver::new(
        TcpProbe::new(8081),
        ResolverConfig {
            probe_timeout: Duration::from_millis(200),
            ..ResolverConfig::default()
        },
    );
    let redirector = Redirector::new(source, resolver);

    let err = redirector
        .redirect("urn:basyx:shell:offline", "submodels")
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::Resolve(_)));
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("endpoints are not reachable"));
}

#[tokio::test]
async fn ping_localhost() {
    if std::env::var("BASYX_INTEGRATION").is_err() {
        eprintln!("Skipping ping test; set BASYX_INTEGRATION=1 to run");
        return;
    }

    let probe = PingProbe::default();
    assert!(probe
        .is_reachable("127.0.0.1", Some(Duration::from_secs(2)))
        .await);
}
