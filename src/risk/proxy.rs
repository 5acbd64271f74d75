//! 代理代號解析
//!
//! 資料集中沒有序列的持倉，依序以明確對照、產業關鍵字、持倉類型、
//! 全域後備找出代理代號；代理本身有序列時才採用。

use tracing::{debug, warn};

use crate::config::TickerPolicy;
use crate::domain_types::{Holding, ReturnsData};

/// 為持倉挑選代理代號（不檢查資料集）
pub fn choose_proxy<'a>(policy: &'a TickerPolicy, holding: &Holding) -> &'a str {
    if let Some(proxy) = policy.explicit_proxies.get(&holding.ticker) {
        return proxy;
    }

    if let Some(sector) = holding.sector.as_deref() {
        let sector = sector.to_lowercase();
        if let Some((_, proxy)) = policy
            .sector_proxies
            .iter()
            .find(|(keyword, _)| sector.contains(keyword.as_str()))
        {
            return proxy;
        }
    }

    policy
        .type_proxies
        .get(&holding.holding_type)
        .unwrap_or(&policy.fallback_proxy)
}

/// 為缺少序列的持倉設定 `proxy_ticker`
pub fn resolve_proxies(policy: &TickerPolicy, holdings: &[Holding], data: &ReturnsData) -> Vec<Holding> {
    holdings
        .iter()
        .map(|holding| {
            if data.has_series(&holding.ticker) {
                return holding.clone();
            }

            let proxy = choose_proxy(policy, holding);
            if data.has_series(proxy) {
                debug!("{} 使用代理 {}", holding.ticker, proxy);
                Holding {
                    proxy_ticker: Some(proxy.to_string()),
                    ..holding.clone()
                }
            } else {
                warn!("{} 沒有報酬序列，代理 {} 也沒有，將排除於計算之外", holding.ticker, proxy);
                holding.clone()
            }
        })
        .collect()
}
