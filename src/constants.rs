use solana_sdk::{pubkey, pubkey::Pubkey};

/// On-chain program owning the idempotency bitmap accounts.
pub const BITMAP_PROGRAM_ID: Pubkey = pubkey!("id7Fj1ywco2RdzTcQFNcYxf6Wu9iJZeNPtQY9xdsw87");

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_MINT: &str = "9tUX5SNcPjEb5qoDGPf6t6jHcUjG2MQKAMU2sL88T9F";
pub const DEFAULT_JOB_ROOT: &str = "txs";

/// Recipients per transaction. Two instructions per recipient plus one
/// trailing mark-bit instruction must stay under the packet size limit;
/// 9 holds for plain SPL transfers, override via config for other limits.
pub const DEFAULT_GROUP_SIZE: usize = 9;

/// Instruction tag for creating a bitmap account, followed by the
/// account size in bytes as a u32 little-endian.
pub const CREATE_MAP_DISCRIMINATOR: [u8; 8] = [0x77, 0x08, 0xa5, 0xf1, 0xbb, 0xc1, 0xb6, 0x70];

/// Instruction tag for setting one bit, followed by the batch index as a
/// u32 little-endian.
pub const MARK_BIT_DISCRIMINATOR: [u8; 8] = [0x65, 0xa6, 0xcb, 0x90, 0xf4, 0xb5, 0x90, 0xbe];
