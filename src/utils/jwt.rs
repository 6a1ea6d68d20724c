use crate::config::JwtConfig;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // 用户 ID
    pub role: String,       // 用户角色
    pub token_type: String, // "access" 或 "refresh"
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    // 生成 Access Token
    pub fn generate_access_token(
        config: &JwtConfig,
        user_id: i64,
        role: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        Self::generate_token_with_expiry(
            config,
            user_id,
            role,
            "access",
            chrono::Duration::minutes(config.access_token_expiry),
        )
    }

    // 生成 Refresh Token
    pub fn generate_refresh_token(
        config: &JwtConfig,
        user_id: i64,
        role: &str,
        remember_me: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        Self::generate_token_with_expiry(
            config,
            user_id,
            role,
            "refresh",
            chrono::Duration::days(Self::refresh_days(config, remember_me)),
        )
    }

    fn refresh_days(config: &JwtConfig, remember_me: bool) -> i64 {
        if remember_me {
            config.refresh_token_remember_me_expiry
        } else {
            config.refresh_token_expiry
        }
    }

    pub fn generate_token_with_expiry(
        config: &JwtConfig,
        user_id: i64,
        role: &str,
        token_type: &str,
        expiry_duration: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expiration = now + expiry_duration;

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            token_type: token_type.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        encode(&Header::default(), &claims, &encoding_key)
    }

    // 同时生成 access 与 refresh token
    pub fn generate_token_pair(
        config: &JwtConfig,
        user_id: i64,
        role: &str,
        remember_me: bool,
    ) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        Ok(TokenPair {
            access_token: Self::generate_access_token(config, user_id, role)?,
            refresh_token: Self::generate_refresh_token(config, user_id, role, remember_me)?,
        })
    }

    pub fn verify_token(
        config: &JwtConfig,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());
        decode::<Claims>(token, &decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
    }

    // 验证 token 是否为指定类型
    pub fn verify_token_type(
        config: &JwtConfig,
        token: &str,
        expected_type: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let claims = Self::verify_token(config, token)?;
        if claims.token_type != expected_type {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }
        Ok(claims)
    }

    pub fn verify_access_token(
        config: &JwtConfig,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::verify_token_type(config, token, "access")
    }

    pub fn verify_refresh_token(
        config: &JwtConfig,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::verify_token_type(config, token, "refresh")
    }

    /// 创建 Refresh Token Cookie
    pub fn create_refresh_token_cookie(
        config: &JwtConfig,
        refresh_token: &str,
        remember_me: bool,
    ) -> Cookie<'static> {
        Cookie::build(REFRESH_TOKEN_COOKIE, refresh_token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::days(Self::refresh_days(
                config,
                remember_me,
            )))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.secure_cookie)
            .finish()
    }

    /// 创建空的 Refresh Token Cookie（用于注销）
    pub fn create_empty_refresh_token_cookie(config: &JwtConfig) -> Cookie<'static> {
        Cookie::build(REFRESH_TOKEN_COOKIE, "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.secure_cookie)
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }
}
