use clap::{Parser, Subcommand};

use chainpoint_anchor::anchor::esplora::EsploraFetcher;
use chainpoint_anchor::anchor::{AnchorType, Network};
use chainpoint_anchor::{HashAlgorithm, MerkleTree, Receipt, ReceiptValidator, Verdict};

#[derive(Parser)]
#[command(name = "chainpoint")]
#[command(about = "Chainpoint v2 proof-of-existence receipts")]
#[command(version)]
struct Cli {
    /// Hash algorithm tag (sha256, sha3-512, ...)
    #[arg(long, default_value = "sha256", global = true)]
    hash: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a Merkle tree over the given values and print the root
    Root {
        /// Leaf values, hashed in order
        values: Vec<String>,
    },
    /// Emit a receipt for one leaf of a tree over the given values
    Receipt {
        /// Index of the leaf to prove
        #[arg(long)]
        index: usize,
        /// Transaction id the root is anchored in
        #[arg(long)]
        txid: String,
        /// Leaf values, hashed in order
        values: Vec<String>,
    },
    /// Validate a receipt file against an expected content hash
    Verify {
        /// Path to the receipt JSON file
        receipt: std::path::PathBuf,
        /// Expected content hash (hex)
        #[arg(long)]
        expected: String,
        /// Bitcoin network the anchor lives on
        #[arg(long, default_value = "main")]
        network: String,
    },
}

fn build_tree(algorithm: HashAlgorithm, values: &[String]) -> chainpoint_anchor::Result<MerkleTree> {
    let mut tree = MerkleTree::new(algorithm);
    tree.add_leaves(values.iter().map(|v| v.as_bytes()));
    tree.build()?;
    Ok(tree)
}

#[tokio::main]
async fn main() -> chainpoint_anchor::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chainpoint_anchor=info")),
        )
        .init();

    let cli = Cli::parse();
    let algorithm = HashAlgorithm::from_tag(&cli.hash)?;

    match cli.command {
        Commands::Root { values } => {
            let tree = build_tree(algorithm, &values)?;
            println!("{}", tree.root_hex()?);
        }
        Commands::Receipt { index, txid, values } => {
            let tree = build_tree(algorithm, &values)?;
            let receipt = Receipt::from_tree(&tree, index, AnchorType::BtcOpReturn, txid)?;
            println!("{}", receipt.to_json()?);
        }
        Commands::Verify {
            receipt,
            expected,
            network,
        } => {
            let json = std::fs::read_to_string(receipt)?;
            let receipt = Receipt::from_json(&json)?;
            let network = match network.as_str() {
                "test" => Network::Test,
                _ => Network::Main,
            };
            let validator = ReceiptValidator::new(EsploraFetcher::new(), network);
            match validator.validate(&receipt, &expected).await? {
                Verdict::Valid => println!("valid"),
                Verdict::Invalid(reason) => {
                    println!("invalid: {reason}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
