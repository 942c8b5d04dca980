use tokio::sync::broadcast;

// ドキュメントストアの変更通知。環境任せのリスナーではなく、
// 明示的な購読ハンドルとして受け渡す
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: &'static str,
    pub key: String,
    pub kind: ChangeKind,
}

// 購読ハンドル。ドロップで購読解除になる
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    // 次の変更イベントを待つ。送信側が全て閉じられたら None。
    // 取りこぼし（lag）はスキップして次を待つ
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
