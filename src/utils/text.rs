//! Text helpers: trailing-number ids and export page cleanup

/// 拆分标识符末尾的十进制数字：`"Item12"` -> `("Item", 12)`
///
/// 没有末尾数字（或数字超出 u64）时返回 `(原串, 0)`。
pub fn split_trailing_numerals(original: &str) -> (&str, u64) {
    let digits = original
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return (original, 0);
    }
    let (base, numerals) = original.split_at(original.len() - digits);
    match numerals.parse::<u64>() {
        Ok(value) => (base, value),
        Err(_) => (original, 0),
    }
}

/// 导出前清理页面文本：去掉首尾空白与所有回车符
pub fn clean_page_text(text: &str) -> String {
    text.trim().replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_trailing_numerals() {
        assert_eq!(split_trailing_numerals("A1"), ("A", 1));
        assert_eq!(split_trailing_numerals("Item042"), ("Item", 42));
        assert_eq!(split_trailing_numerals("A"), ("A", 0));
        assert_eq!(split_trailing_numerals("12"), ("", 12));
        assert_eq!(split_trailing_numerals("标题3"), ("标题", 3));
        assert_eq!(split_trailing_numerals(""), ("", 0));
    }

    #[test]
    fn test_split_overflowing_numerals_keeps_original() {
        let huge = "A99999999999999999999999";
        assert_eq!(split_trailing_numerals(huge), (huge, 0));
    }

    #[test]
    fn test_clean_page_text() {
        assert_eq!(clean_page_text("  Hello\r\nWorld \r\n"), "Hello\nWorld");
        assert_eq!(clean_page_text("a\rb\rc"), "abc");
        assert_eq!(clean_page_text("   "), "");
    }
}
