use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Signs claims the way the account service does; tests only.
#[cfg(test)]
pub fn sign(claims: &Claims, secret: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
pub fn claims(role: u8, teacher_id: Option<u64>, ttl_secs: i64) -> Claims {
    Claims {
        user_id: 1,
        sub: "tester".into(),
        role,
        exp: (chrono::Utc::now().timestamp() + ttl_secs) as usize,
        teacher_id,
    }
}
