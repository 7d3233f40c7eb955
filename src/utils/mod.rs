use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::api::models::Role;

// 桩服务端使用最低代价，避免测试变慢
pub const STUB_BCRYPT_COST: u32 = 4;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), STUB_BCRYPT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub role: Role,  // 角色声明
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub fn generate_token(
    user_id: i64,
    role: Role,
    secret: &str,
    ttl_secs: i64,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = (now + Duration::seconds(ttl_secs)).timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration,
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// 客户端读取令牌中的声明（不校验签名，仅用于角色与过期时间）
///
/// 不是 JWT 的不透明令牌返回 `None`。
pub fn peek_claims(token: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

/// 令牌指纹，日志中代替令牌本身
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_tokens_verify_and_carry_role() {
        let (token, exp) = generate_token(7, Role::Doctor, SECRET, 3600).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.exp, exp);
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn claims_can_be_read_without_the_secret() {
        let (token, _) = generate_token(3, Role::Patient, SECRET, 60).unwrap();
        let claims = peek_claims(&token).unwrap();
        assert_eq!(claims.role, Role::Patient);
        assert!(peek_claims("opaque-session-token").is_none());
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = token_fingerprint("abc");
        assert_eq!(a.len(), 12);
        assert_eq!(a, token_fingerprint("abc"));
        assert_ne!(a, token_fingerprint("abd"));
    }

    #[test]
    fn passwords_round_trip_through_bcrypt() {
        let hashed = hash_password("Password123!").unwrap();
        assert!(verify_password("Password123!", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }
}
