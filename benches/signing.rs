//! Benchmarks for claim assembly and signing.

use criterion::{criterion_group, criterion_main, Criterion};

use jwt_mint::{issue_token, ClaimParams, IssueOptions, JwsAlgorithm, Role};

fn hs256_role() -> Role {
    Role {
        algorithm: JwsAlgorithm::Hs256,
        key: "super_secret_signing_key".to_owned(),
        issuer: "token-service".to_owned(),
        subject: String::new(),
        audience: "content_management".to_owned(),
    }
}

fn issuance_benches(criterion: &mut Criterion) {
    let role = hs256_role();
    let options = IssueOptions::default();

    criterion.bench_function("issue/defaults", |bencher| {
        bencher.iter(|| issue_token(&role, &ClaimParams::default(), &options).unwrap());
    });

    let params = ClaimParams {
        subject: "john.doe@example.com".to_owned(),
        expiration: 1_893_456_000,
        claims: r#"{"scope": "read write", "roles": ["content_manager"]}"#.to_owned(),
        ..ClaimParams::default()
    };
    criterion.bench_function("issue/full", |bencher| {
        bencher.iter(|| issue_token(&role, &params, &options).unwrap());
    });
}

criterion_group!(benches, issuance_benches);
criterion_main!(benches);
