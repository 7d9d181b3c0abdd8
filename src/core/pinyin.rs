//! Local, network-free transliteration used as the last resort

use ::pinyin::ToPinyin;

use crate::core::slug::format_slug;

/// Han characters become toneless syllables; other runs stay whole words
pub fn transliterate(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        match ch.to_pinyin() {
            Some(syllable) => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                words.push(syllable.plain().to_string());
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    format_slug(&words.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_han_characters() {
        assert_eq!(transliterate("你好世界"), "ni-hao-shi-jie");
        assert_eq!(transliterate("中国"), "zhong-guo");
    }

    #[test]
    fn test_mixed_text() {
        assert_eq!(transliterate("Rust 编程 2024"), "rust-bian-cheng-2024");
        assert_eq!(transliterate("iPhone手机"), "iphone-shou-ji");
    }

    #[test]
    fn test_symbols_only() {
        assert_eq!(transliterate("！？……"), "");
        assert_eq!(transliterate(""), "");
    }
}
