use proc_macro2::TokenStream;
use quote::quote;
use std::env;
use std::fs;
use std::path::Path;

// Note: These types are only used in build.rs for parsing the TOML file
// The actual tables used in the crate are generated from this data

#[derive(Debug, serde::Deserialize)]
struct PolicyFile {
    tickers: TickerTables,
    cash: CashTables,
    proxy: ProxyTables,
}

#[derive(Debug, serde::Deserialize)]
struct TickerTables {
    known: Vec<String>,
    pdf_structural: Vec<String>,
    boilerplate: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CashTables {
    equivalent_ticker: String,
    equivalent_name: String,
    money_market: Vec<String>,
    sweep_phrases: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ProxyTables {
    explicit: Vec<ExplicitProxy>,
    sector: Vec<SectorProxy>,
    by_type: Vec<TypeProxy>,
    fallback: String,
}

#[derive(Debug, serde::Deserialize)]
struct ExplicitProxy {
    ticker: String,
    proxy: String,
}

#[derive(Debug, serde::Deserialize)]
struct SectorProxy {
    keyword: String,
    proxy: String,
}

#[derive(Debug, serde::Deserialize)]
struct TypeProxy {
    holding_type: String,
    proxy: String,
}

fn main() {
    println!("cargo:rerun-if-changed=config/ticker_policy.toml");

    // 讀取 ticker_policy.toml
    let toml_content = fs::read_to_string("config/ticker_policy.toml")
        .expect("Failed to read config/ticker_policy.toml");

    let policy: PolicyFile =
        toml::from_str(&toml_content).expect("Failed to parse config/ticker_policy.toml");

    let tables = generate_policy_tables(&policy);

    // 寫入到輸出目錄
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("ticker_policy_generated.rs");

    fs::write(&dest_path, tables.to_string())
        .expect("Failed to write generated ticker policy tables");
}

fn upper(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.trim().to_uppercase()).collect()
}

fn generate_policy_tables(policy: &PolicyFile) -> TokenStream {
    let known = upper(&policy.tickers.known);
    let pdf_structural = upper(&policy.tickers.pdf_structural);
    let boilerplate = upper(&policy.tickers.boilerplate);
    let money_market = upper(&policy.cash.money_market);
    let sweep_phrases = upper(&policy.cash.sweep_phrases);
    let cash_ticker = policy.cash.equivalent_ticker.trim().to_uppercase();
    let cash_name = &policy.cash.equivalent_name;

    let explicit = policy.proxy.explicit.iter().map(|p| {
        let ticker = p.ticker.to_uppercase();
        let proxy = p.proxy.to_uppercase();
        quote! { (#ticker, #proxy) }
    });
    let sector = policy.proxy.sector.iter().map(|p| {
        let keyword = p.keyword.to_lowercase();
        let proxy = p.proxy.to_uppercase();
        quote! { (#keyword, #proxy) }
    });
    let by_type = policy.proxy.by_type.iter().map(|p| {
        let holding_type = p.holding_type.to_lowercase();
        let proxy = p.proxy.to_uppercase();
        quote! { (#holding_type, #proxy) }
    });
    let fallback = policy.proxy.fallback.to_uppercase();

    quote! {
        /// 已知代號清單
        pub const KNOWN_TICKERS: &[&str] = &[#(#known),*];
        /// PDF 結構標記
        pub const PDF_STRUCTURAL_TOKENS: &[&str] = &[#(#pdf_structural),*];
        /// 英文常用字與對帳單樣板字
        pub const BOILERPLATE_WORDS: &[&str] = &[#(#boilerplate),*];
        /// 貨幣市場基金代號
        pub const MONEY_MARKET_TICKERS: &[&str] = &[#(#money_market),*];
        /// 現金掃單片語
        pub const CASH_SWEEP_PHRASES: &[&str] = &[#(#sweep_phrases),*];
        /// 現金等價代號
        pub const CASH_EQUIVALENT_TICKER: &str = #cash_ticker;
        /// 現金等價持倉名稱
        pub const CASH_EQUIVALENT_NAME: &str = #cash_name;
        /// 明確代理 (代號, 代理)
        pub const EXPLICIT_PROXIES: &[(&str, &str)] = &[#(#explicit),*];
        /// 產業代理 (關鍵字, 代理)
        pub const SECTOR_PROXIES: &[(&str, &str)] = &[#(#sector),*];
        /// 類型代理 (類型, 代理)
        pub const TYPE_PROXIES: &[(&str, &str)] = &[#(#by_type),*];
        /// 最終代理
        pub const FALLBACK_PROXY: &str = #fallback;
    }
}
