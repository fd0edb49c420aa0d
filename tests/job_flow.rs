use std::{
    fs,
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use spray::{
    broadcast::broadcast_all,
    constants::BITMAP_PROGRAM_ID,
    errors::RpcError,
    operations,
    rpc::LedgerConnection,
    store,
    JobConfig,
};

/// In-memory ledger stand-in: records confirmed and fire-and-forget
/// submissions, and serves a configurable bitmap account.
#[derive(Default)]
struct MockConnection {
    processed: Mutex<Vec<Transaction>>,
    sent: Mutex<Vec<Transaction>>,
    bitmap: Mutex<Option<Vec<u8>>>,
}

impl MockConnection {
    fn set_bitmap(&self, bytes: Vec<u8>) {
        *self.bitmap.lock().unwrap() = Some(bytes);
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerConnection for MockConnection {
    async fn process_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.processed.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.sent.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(Hash::new_unique())
    }

    async fn get_account(&self, _address: &Pubkey) -> Result<Option<Account>, RpcError> {
        Ok(self.bitmap.lock().unwrap().as_ref().map(|data| Account {
            lamports: 1,
            data: data.clone(),
            owner: BITMAP_PROGRAM_ID,
            executable: false,
            rent_epoch: 0,
        }))
    }
}

struct TestJob {
    root: PathBuf,
    config: JobConfig,
    recipients_path: PathBuf,
}

impl Drop for TestJob {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

/// 20 recipients, amount 5 each, group size 9: the concrete scenario from
/// the job design (3 batches of 9, 9 and 2; 1-byte bitmap).
fn setup_job(recipient_count: usize) -> TestJob {
    let root = std::env::temp_dir().join(format!("spray-flow-{}", rand::random::<u64>()));
    fs::create_dir_all(&root).unwrap();

    let entries: Vec<String> = (0..recipient_count)
        .map(|_| format!(r#""{}": 5"#, Pubkey::new_unique()))
        .collect();
    let recipients_path = root.join("recips.json");
    fs::write(&recipients_path, format!("{{{}}}", entries.join(", "))).unwrap();

    let config = JobConfig {
        rpc_url: "http://localhost:8899".to_string(),
        mint: Pubkey::new_unique(),
        payer_keypair: Keypair::new(),
        group_size: 9,
        job_root: root.join("txs"),
    };
    TestJob {
        root,
        config,
        recipients_path,
    }
}

#[tokio::test]
async fn test_fresh_run_persists_then_broadcasts() {
    let job = setup_job(20);
    let conn = MockConnection::default();

    let summary = operations::prepare_and_send(&conn, &job.config, &job.recipients_path)
        .await
        .unwrap();

    assert_eq!(summary.sent, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(conn.sent_count(), 3);

    // One confirmed submission: the bitmap account creation, sized 1 byte.
    let processed = conn.processed.lock().unwrap();
    assert_eq!(processed.len(), 1);
    let create_ix = &processed[0].message.instructions[0];
    assert_eq!(&create_ix.data[8..], &1u32.to_le_bytes());

    // Job directory holds key, _0, _1, _2.
    let mut names: Vec<String> = fs::read_dir(&summary.job_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["_0", "_1", "_2", "key"]);
}

#[tokio::test]
async fn test_resume_resends_all_when_nothing_confirmed() {
    let job = setup_job(20);
    let conn = MockConnection::default();
    let summary = operations::prepare_and_send(&conn, &job.config, &job.recipients_path)
        .await
        .unwrap();

    // Bitmap account exists with no bits set.
    conn.set_bitmap(vec![0u8]);

    let resumed = operations::resume(&conn, &job.config, &summary.job_dir)
        .await
        .unwrap();
    assert_eq!(resumed.sent, 3);
    assert_eq!(resumed.skipped, 0);
    assert_eq!(conn.sent_count(), 6);
}

#[tokio::test]
async fn test_resume_skips_confirmed_batches() {
    let job = setup_job(20);
    let conn = MockConnection::default();
    let summary = operations::prepare_and_send(&conn, &job.config, &job.recipients_path)
        .await
        .unwrap();

    // Batches 0 and 1 landed in the previous run.
    conn.set_bitmap(vec![0b0000_0011]);

    let resumed = operations::resume(&conn, &job.config, &summary.job_dir)
        .await
        .unwrap();
    assert_eq!(resumed.skipped, 2);
    assert_eq!(resumed.sent, 1);
    assert_eq!(conn.sent_count(), 4);
}

#[tokio::test]
async fn test_resume_is_idempotent() {
    let job = setup_job(20);
    let conn = MockConnection::default();
    let summary = operations::prepare_and_send(&conn, &job.config, &job.recipients_path)
        .await
        .unwrap();

    conn.set_bitmap(vec![0u8]);

    let first = operations::resume(&conn, &job.config, &summary.job_dir)
        .await
        .unwrap();
    let second = operations::resume(&conn, &job.config, &summary.job_dir)
        .await
        .unwrap();
    assert_eq!(first.sent, second.sent);
    assert_eq!(first.skipped, second.skipped);

    // Same batch set both times.
    let pending = store::load_pending(&summary.job_dir).unwrap();
    assert_eq!(pending.len(), 3);
}

#[tokio::test]
async fn test_resume_without_tracker_account_resends_everything() {
    let job = setup_job(20);
    let conn = MockConnection::default();
    let summary = operations::prepare_and_send(&conn, &job.config, &job.recipients_path)
        .await
        .unwrap();

    // Tracker account never landed: nothing can be skipped.
    let resumed = operations::resume(&conn, &job.config, &summary.job_dir)
        .await
        .unwrap();
    assert_eq!(resumed.sent, 3);
    assert_eq!(resumed.skipped, 0);
}

#[tokio::test]
async fn test_broadcast_empty_set_is_a_no_op() {
    let conn = MockConnection::default();
    let payer = Keypair::new();
    let outcomes = broadcast_all(&conn, &payer, &[]).await.unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(conn.sent_count(), 0);
}
