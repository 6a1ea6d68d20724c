use rand::Rng;
use rand::distr::Alphanumeric;

/// 生成指定长度的随机字母数字串
pub fn generate_random_code(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_charset() {
        let code = generate_random_code(32);
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(code, generate_random_code(32));
    }
}
