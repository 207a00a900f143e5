//! Benchmarks for issuing / verifying tokens.

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand_core::OsRng;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use jwt_engine::{alg::Algorithm, Claims, Configuration, Header, JwtEngine, TimeOptions, UntrustedToken};

// Fairly small list of claims.
#[derive(Serialize)]
struct CustomClaims {
    #[serde(rename = "aud")]
    audience: String,
    #[serde(rename = "sub")]
    user_id: Uuid,
    #[serde(rename = "jti")]
    token_id: Uuid,
    name: String,
    email: String,
    roles: Vec<Role>,
}

impl Default for CustomClaims {
    fn default() -> Self {
        Self {
            audience: "content_management".to_owned(),
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            name: "John Doe".to_owned(),
            email: "john.doe@example.com".to_string(),
            roles: vec![Role::ContentManager],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(dead_code)]
enum Role {
    ContentManager,
    Janitor,
    Admin,
}

fn create_claims(time_options: &TimeOptions) -> Claims {
    let Value::Object(map) = serde_json::to_value(CustomClaims::default()).unwrap() else {
        unreachable!("claims are serialized as an object");
    };
    Claims::from(map)
        .set_duration_and_issuance(time_options, Duration::minutes(10))
        .set_not_before(Utc::now() - Duration::minutes(10))
}

fn engines() -> Vec<JwtEngine> {
    let key_id = Uuid::new_v4().to_string();
    let hs256 = Configuration::new(Algorithm::Hs256)
        .with_secret(b"super_secret_key_donut_steel".to_vec())
        .with_header(Header::empty().with_key_id(&key_id));

    let secret_key = p256::SecretKey::random(&mut OsRng);
    let es256 = Configuration::new(Algorithm::Es256)
        .with_private_key(secret_key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string())
        .with_public_key(
            secret_key
                .public_key()
                .to_public_key_pem(LineEnding::LF)
                .unwrap(),
        )
        .with_header(Header::empty().with_key_id(key_id));

    vec![JwtEngine::new(hs256), JwtEngine::new(es256)]
}

fn encoding_benches(criterion: &mut Criterion) {
    let time_options = TimeOptions::default();
    for engine in engines() {
        let name = format!("encoding/{}", engine.configuration().algorithm());
        criterion.bench_function(&name, |bencher| {
            bencher.iter(|| block_on(engine.sign(create_claims(&time_options))).unwrap());
        });
    }
}

fn decoding_benches(criterion: &mut Criterion) {
    let time_options = TimeOptions::default();
    for engine in engines() {
        let algorithm = engine.configuration().algorithm().to_owned();
        let token = block_on(engine.sign(create_claims(&time_options))).unwrap();

        criterion.bench_function(&format!("decoding/{algorithm}"), |bencher| {
            bencher.iter(|| UntrustedToken::new(&token).unwrap());
        });
        criterion.bench_function(&format!("decoding/{algorithm}/integrity"), |bencher| {
            bencher.iter(|| engine.verify_integrity(&token).unwrap());
        });
        criterion.bench_function(&format!("decoding/{algorithm}/full"), |bencher| {
            bencher.iter(|| block_on(engine.verify(&token)).unwrap());
        });
    }
}

criterion_group!(benches, encoding_benches, decoding_benches);
criterion_main!(benches);
