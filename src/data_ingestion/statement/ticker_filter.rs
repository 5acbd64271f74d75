//! 代號可信度過濾
//!
//! 決定解析器的誤判率：長度與字元檢查、PDF 結構標記與樣板字黑名單、
//! 長度 1-2 的代號必須在已知清單內。

use crate::config::TickerPolicy;

const MAX_TICKER_LEN: usize = 6;

/// 判斷字串是否像是代號（輸入須已轉為大寫）
pub fn looks_like_ticker(policy: &TickerPolicy, candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_TICKER_LEN {
        return false;
    }
    if !candidate.chars().all(|c| c.is_ascii_uppercase()) {
        return false;
    }
    if policy.pdf_structural_tokens.contains(candidate) || policy.boilerplate_words.contains(candidate) {
        return false;
    }
    if candidate.len() <= 2 {
        return policy.is_known(candidate);
    }
    true
}

/// 取儲存格的第一個詞（空白、連字號、破折號或逗號分隔）並轉大寫，
/// 處理 "AAPL - Apple Inc" 這類格式
pub fn first_token(cell: &str) -> String {
    cell.trim()
        .to_uppercase()
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ','))
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// 從自由文字的詞中取出候選代號：只保留 ASCII 字母，
/// 含小寫字母的詞（一般英文單字）不視為代號
///
/// 刻意不把詞轉成大寫後再篩字母：否則 "Total" 會剩下 "T"，成為已知代號。
/// 代價是 "BRK.b" 這類大小寫混合的代號在自由文字中會被略過。
pub fn text_candidate(token: &str) -> Option<String> {
    let letters: String = token.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() || letters.chars().any(|c| c.is_ascii_lowercase()) {
        return None;
    }
    Some(letters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SPY", true)]
    #[case("AAPL", true)]
    #[case("GOOGL", true)]
    #[case("V", true)]
    #[case("T", true)]
    #[case("ZZZ", true)]
    #[case("Q", false)]
    #[case("XY", false)]
    #[case("ENDOBJ", false)]
    #[case("STREAM", false)]
    #[case("FUND", false)]
    #[case("SWEEP", false)]
    #[case("BALANCE", false)]
    #[case("TOOLONGX", false)]
    #[case("SP5", false)]
    #[case("spy", false)]
    #[case("", false)]
    fn test_looks_like_ticker(#[case] input: &str, #[case] expected: bool) {
        let policy = TickerPolicy::builtin();
        assert_eq!(looks_like_ticker(&policy, input), expected, "input: {}", input);
    }

    #[rstest]
    #[case("AAPL - Apple Inc", "AAPL")]
    #[case("  msft Microsoft", "MSFT")]
    #[case("BRK,B", "BRK")]
    #[case("VTI—Vanguard", "VTI")]
    #[case("", "")]
    fn test_first_token(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(first_token(input), expected);
    }

    #[test]
    fn test_text_candidate() {
        assert_eq!(text_candidate("SPY,").as_deref(), Some("SPY"));
        assert_eq!(text_candidate("(AAPL)").as_deref(), Some("AAPL"));
        assert_eq!(text_candidate("Total"), None);
        assert_eq!(text_candidate("123.45"), None);
    }

    #[rstest]
    #[case("BRK.b", "BRKB")]
    #[case("Brk.B", "BRKB")]
    #[case("Spy", "SPY")]
    fn test_mixed_case_tokens_are_not_candidates(#[case] token: &str, #[case] upper: &str) {
        assert_eq!(text_candidate(token), None);
        assert_eq!(text_candidate(&token.to_uppercase()).as_deref(), Some(upper));
    }
}
