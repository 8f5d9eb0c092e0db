//! Order Number Generation
//!
//! `ORD-<unix millis>-<6 random base36 uppercase chars>` — 持久化的订单编号
//! 格式是稳定的外部契约，不可更改。
//!
//! 碰撞概率极低，不做预检查；真撞上时由 `order_number` 唯一索引兜底，
//! 引擎重新生成并重试一次。

use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a new order number
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}
