use kernel::model::booking::PaymentStatus;
use serde::{Deserialize, Serialize};

// 在籍情報のうち提出時スナップショットに写し取られる部分。
// この処理系からは読み取り専用
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}
