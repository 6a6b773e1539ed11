use bpe_playground::{TrainConfig, Tokenizer};

fn main() -> bpe_playground::Result<()> {
    let corpus = "Manoj lives in Maharashtra. Manoj codes a lot. Maharashtra is big.";
    let cfg = TrainConfig::new(300).with_specials(["<NAME>", "<CITY>"]);
    let tok = Tokenizer::train(corpus, &cfg)?;

    let stats = tok.stats();
    println!(
        "Trained: vocab={}, merges={}, specials={:?}",
        stats.vocab_size, stats.merges, stats.specials
    );

    for text in ["My name is <NAME> from <CITY>.", "Hello FROM 414001!"] {
        let enc = tok.encode(text);
        println!("\n{text}");
        println!("  tokens: {:?}", enc.tokens);
        println!("  ids:    {:?}", enc.ids);
        println!("  decode: {}", tok.decode(&enc.ids));
    }

    Ok(())
}
