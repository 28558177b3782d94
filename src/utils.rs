use std::time::Duration;

use tracing::{info, instrument};

static FORBIDDEN_CHARS: [char; 10] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\''];

/// 把文件名中的非法字符替换为空格
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { ' ' } else { c })
        .collect()
}

/// 每个单词首字母大写，其余小写
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[instrument]
pub fn display_elapsed_time(duration: Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        // 超过1分钟：显示分秒
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        info!("✅ 爬取完成！耗时: {}分{}秒", mins, secs);
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;
        info!("✅ 爬取完成！耗时: {}秒{}毫秒", secs, ms_remaining);
    } else {
        info!("✅ 爬取完成！耗时: {}毫秒", total_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_every_forbidden_char() {
        assert_eq!(
            sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j'k"#),
            "a b c d e f g h i j k"
        );
    }

    #[test]
    fn keeps_unicode_names() {
        assert_eq!(sanitize_filename("第1话 - 01"), "第1话 - 01");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(
            title_case("myst might MAYHEM chapter 1"),
            "Myst Might Mayhem Chapter 1"
        );
        assert_eq!(title_case(""), "");
    }

    proptest! {
        #[test]
        fn output_has_no_forbidden_chars(s in ".*") {
            let out = sanitize_filename(&s);
            prop_assert!(!out.chars().any(|c| FORBIDDEN_CHARS.contains(&c)));
        }

        #[test]
        fn clean_input_is_unchanged(s in "[^\\\\/:*?\"<>|']*") {
            prop_assert_eq!(sanitize_filename(&s), s);
        }

        #[test]
        fn idempotent(s in ".*") {
            let once = sanitize_filename(&s);
            prop_assert_eq!(sanitize_filename(&once), once.clone());
        }

        #[test]
        fn keeps_char_count(s in ".*") {
            prop_assert_eq!(sanitize_filename(&s).chars().count(), s.chars().count());
        }
    }
}
