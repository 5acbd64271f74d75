//! PDF 文字行重建
//!
//! 逐頁解碼內容串流，依目前字型的 `/Encoding` 或 `/ToUnicode` 對照表解碼字串，
//! 追蹤文字行矩陣的垂直位置，將同一 Y 座標（四捨五入）的文字片段合併為一行，
//! 頁內由上而下輸出。

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};

use super::error::StatementResult;

/// 最多讀取的頁數
pub const MAX_PAGES: usize = 20;

/// TJ 陣列中視為字間空白的位移門檻（千分之一字級）
const KERNING_SPACE_THRESHOLD: f64 = -250.0;

/// 讀取 PDF 並重建文字行
pub fn read_text(bytes: &[u8]) -> StatementResult<String> {
    let doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();
    debug!("PDF 共 {} 頁，讀取前 {} 頁", pages.len(), MAX_PAGES.min(pages.len()));

    let mut text = String::new();
    for (page_number, page_id) in pages.into_iter().take(MAX_PAGES) {
        let content = match doc.get_page_content(page_id).and_then(|data| Content::decode(&data)) {
            Ok(content) => content,
            Err(err) => {
                warn!("第 {} 頁內容無法解碼: {}", page_number, err);
                continue;
            }
        };
        let fonts = doc.get_page_fonts(page_id).unwrap_or_else(|err| {
            debug!("第 {} 頁字型讀取失敗: {}", page_number, err);
            BTreeMap::new()
        });
        for line in page_lines(&content, |font, bytes| decode_with_font(&doc, &fonts, font, bytes)) {
            text.push_str(&line);
            text.push('\n');
        }
    }
    Ok(text)
}

/// 以頁面資源中的字型解碼字串；找不到字型或編碼無法使用時退回 [`decode_string`]
fn decode_with_font(
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: Option<&[u8]>,
    bytes: &[u8],
) -> String {
    let Some(font_name) = font else {
        return decode_string(bytes);
    };
    let decoded = fonts
        .get(font_name)
        .and_then(|dict| dict.get_font_encoding(doc).ok())
        .and_then(|encoding| Document::decode_text(&encoding, bytes).ok());
    match decoded {
        Some(text) => text,
        None => {
            debug!("字型 {} 無可用編碼，改以 Latin-1 解碼", String::from_utf8_lossy(font_name));
            decode_string(bytes)
        }
    }
}

/// 文字狀態
///
/// `font` 與 `leading` 屬於跨 BT/ET 保留的文字狀態；行矩陣只保留計算 Y 所需的
/// `b`、`d`、`f` 三個分量，BT 時重設為單位矩陣。
#[derive(Debug)]
struct TextState {
    font: Option<Vec<u8>>,
    leading: f64,
    line_b: f64,
    line_d: f64,
    line_y: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            leading: 0.0,
            line_b: 0.0,
            line_d: 1.0,
            line_y: 0.0,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.line_b = 0.0;
        self.line_d = 1.0;
        self.line_y = 0.0;
    }

    fn set_matrix(&mut self, b: f64, d: f64, f: f64) {
        self.line_b = b;
        self.line_d = d;
        self.line_y = f;
    }

    /// 行矩陣左乘平移 (tx, ty)
    fn translate(&mut self, tx: f64, ty: f64) {
        self.line_y += tx * self.line_b + ty * self.line_d;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// 無字型資訊時的字串解碼：有 BOM 時視為 UTF-16BE，否則逐位元組視為 Latin-1
fn decode_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|b| char::from(*b)).collect()
}

fn show_text<F>(operand: Option<&Object>, decode: &F) -> String
where
    F: Fn(&[u8]) -> String,
{
    match operand {
        Some(Object::String(bytes, _)) => decode(bytes),
        Some(Object::Array(items)) => {
            let mut out = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => out.push_str(&decode(bytes)),
                    other => {
                        if number(other).is_some_and(|offset| offset < KERNING_SPACE_THRESHOLD) {
                            out.push(' ');
                        }
                    }
                }
            }
            out
        }
        _ => String::new(),
    }
}

/// 依 Y 座標分組後由上而下輸出文字行
///
/// `decode` 接收目前字型的資源名稱（尚未設定時為 `None`）與字串位元組。
fn page_lines<D>(content: &Content, decode: D) -> Vec<String>
where
    D: Fn(Option<&[u8]>, &[u8]) -> String,
{
    let mut fragments: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    let mut state = TextState::default();

    for op in &content.operations {
        let operands = &op.operands;
        let font = state.font.clone();
        let decode_current = |bytes: &[u8]| decode(font.as_deref(), bytes);

        let shown = match op.operator.as_str() {
            "BT" => {
                state.begin_text();
                None
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.font = Some(name.clone());
                }
                None
            }
            "Tm" => {
                let values: Vec<f64> = operands.iter().filter_map(number).collect();
                if let [_, b, _, d, _, f] = values[..] {
                    state.set_matrix(b, d, f);
                }
                None
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) =
                    (operands.first().and_then(number), operands.get(1).and_then(number))
                {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate(tx, ty);
                }
                None
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
                None
            }
            "T*" => {
                state.next_line();
                None
            }
            "Tj" | "TJ" => Some(show_text(operands.first(), &decode_current)),
            "'" => {
                state.next_line();
                Some(show_text(operands.first(), &decode_current))
            }
            "\"" => {
                state.next_line();
                Some(show_text(operands.get(2), &decode_current))
            }
            _ => None,
        };

        if let Some(text) = shown.filter(|t| !t.trim().is_empty()) {
            fragments.entry(state.line_y.round() as i64).or_default().push(text);
        }
    }

    fragments
        .into_iter()
        .rev()
        .map(|(_, parts)| parts.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream, StringFormat};

    fn literal(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    /// 子集字型的 ToUnicode 對照：字形編號 → Unicode
    const SUBSET_CMAP: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
8 beginbfchar
<0036> <0053>
<0033> <0050>
<003C> <0059>
<0024> <0041>
<002A> <0047>
<0019> <0036>
<0013> <0030>
<0008> <0025>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

    /// 以字形編號（每字 2 位元組）組成的十六進位字串
    fn glyphs(ids: &[u16]) -> Object {
        let bytes = ids.iter().flat_map(|id| id.to_be_bytes()).collect();
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    fn build_pdf(operations: Vec<Operation>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, SUBSET_CMAP.as_bytes().to_vec()));
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "ABCDEF+Arial",
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
        });
        let subset_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+Arial",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![descendant_id.into()],
            "ToUnicode" => to_unicode_id,
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id, "F2" => subset_font_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_lines_grouped_by_y_top_to_bottom() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 600.into()]),
            Operation::new("Tj", vec![literal("AGG")]),
            Operation::new("Td", vec![100.into(), 0.into()]),
            Operation::new("Tj", vec![literal("40%")]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![literal("SPY")]),
            Operation::new("Td", vec![100.into(), 0.into()]),
            Operation::new("Tj", vec![literal("60%")]),
            Operation::new("ET", vec![]),
        ];
        let text = read_text(&build_pdf(ops)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["SPY 60%", "AGG 40%"]);
    }

    #[test]
    fn test_tj_array_kerning_inserts_space() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), 500.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![literal("VTI"), Object::Integer(-300), literal("100%")])],
            ),
            Operation::new("ET", vec![]),
        ];
        let text = read_text(&build_pdf(ops)).unwrap();
        assert_eq!(text.trim(), "VTI 100%");
    }

    #[test]
    fn test_subset_font_decoded_through_to_unicode() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F2".into(), 10.into()]),
            Operation::new("Td", vec![72.into(), 640.into()]),
            Operation::new("Tj", vec![glyphs(&[0x0036, 0x0033, 0x003C])]),
            Operation::new("Td", vec![120.into(), 0.into()]),
            Operation::new("Tj", vec![glyphs(&[0x0019, 0x0013, 0x0008])]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![72.into(), 620.into()]),
            Operation::new("Tj", vec![glyphs(&[0x0024, 0x002A, 0x002A])]),
            Operation::new("ET", vec![]),
        ];
        let text = read_text(&build_pdf(ops)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["SPY 60%", "AGG"]);
    }

    #[test]
    fn test_subset_font_statement_yields_holdings() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F2".into(), 10.into()]),
            Operation::new("Td", vec![72.into(), 640.into()]),
            Operation::new("Tj", vec![glyphs(&[0x0036, 0x0033, 0x003C])]),
            Operation::new("Td", vec![120.into(), 0.into()]),
            Operation::new("Tj", vec![glyphs(&[0x0019, 0x0013, 0x0008])]),
            Operation::new("ET", vec![]),
        ];
        let result = crate::data_ingestion::parse_pdf_blocking(&build_pdf(ops));
        assert_eq!(result.error, None);
        let spy = result.holdings.iter().find(|h| h.ticker == "SPY").map(|h| h.allocation);
        assert_eq!(spy, Some(60.0));
    }

    #[test]
    fn test_leading_persists_across_text_blocks() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![literal("SPY 60%")]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![50.into(), 500.into()]),
            Operation::new("Tj", vec![literal("AGG 30%")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![literal("BIL 10%")]),
            Operation::new("ET", vec![]),
        ];
        let text = read_text(&build_pdf(ops)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["SPY 60%", "AGG 30%", "BIL 10%"]);
    }

    #[test]
    fn test_td_offset_scaled_by_text_matrix() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tm", vec![2.into(), 0.into(), 0.into(), 2.into(), 50.into(), 700.into()]),
            Operation::new("Tj", vec![literal("SPY")]),
            // 縮放 2 倍：實際下移 20
            Operation::new("Td", vec![0.into(), (-10).into()]),
            Operation::new("Tj", vec![literal("AGG")]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 690.into()]),
            Operation::new("Tj", vec![literal("QQQ")]),
            Operation::new("ET", vec![]),
        ];
        let text = read_text(&build_pdf(ops)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["SPY", "QQQ", "AGG"]);
    }

    #[test]
    fn test_unknown_font_falls_back_to_latin1() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F9".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![literal("VTI 100%")]),
            Operation::new("ET", vec![]),
        ];
        let text = read_text(&build_pdf(ops)).unwrap();
        assert_eq!(text.trim(), "VTI 100%");
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, 0x53, 0x00, 0x50, 0x00, 0x59];
        assert_eq!(decode_string(&bytes), "SPY");
        assert_eq!(decode_string(b"AGG"), "AGG");
    }

    #[test]
    fn test_invalid_pdf_is_error() {
        assert!(read_text(b"not a pdf at all").is_err());
    }
}
