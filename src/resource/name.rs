use regex_lite::Regex;
use std::sync::OnceLock;

use crate::dataplane::ApiError;

// HAProxy 섹션/서버 이름에 허용되는 문자
const NAME_PATTERN: &str = r"^[A-Za-z0-9_.:-]+$";

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(NAME_PATTERN).expect("name pattern is valid"))
}

/// 요청 경로에 들어갈 엔티티 이름을 검증합니다.
pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name_regex().is_match(name) {
        Ok(())
    } else {
        Err(ApiError::InvalidName {
            name: name.to_string(),
        })
    }
}
