//! 阿拉伯数字转换工具
//!
//! 显示屏与票据输出使用东阿拉伯数字。

const ARABIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// 西文数字转东阿拉伯数字
pub fn to_arabic_numbers(input: &str) -> String {
    input
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => ARABIC_DIGITS[d as usize],
            None => c,
        })
        .collect()
}

/// 东阿拉伯数字转西文数字
pub fn to_english_numbers(input: &str) -> String {
    input
        .chars()
        .map(|c| match ARABIC_DIGITS.iter().position(|&d| d == c) {
            Some(i) => char::from_digit(i as u32, 10).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// 整数转东阿拉伯数字字符串
pub fn number_to_arabic(num: i32) -> String {
    to_arabic_numbers(&num.to_string())
}

/// 周几的阿拉伯语名称（周日起始）
pub const ARABIC_DAYS: [&str; 7] = [
    "الأحد",
    "الاثنين",
    "الثلاثاء",
    "الأربعاء",
    "الخميس",
    "الجمعة",
    "السبت",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_arabic_numbers() {
        assert_eq!(to_arabic_numbers("15"), "١٥");
        assert_eq!(to_arabic_numbers("عيادة 3"), "عيادة ٣");
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(to_english_numbers(&to_arabic_numbers("2024")), "2024");
    }

    #[test]
    fn test_number_to_arabic() {
        assert_eq!(number_to_arabic(0), "٠");
        assert_eq!(number_to_arabic(123), "١٢٣");
    }
}
