use vergen_gitcl::{BuildBuilder, CargoBuilder, Emitter, GitclBuilder};

const FALLBACK_KEYS: [&str; 2] = ["VERGEN_BUILD_DATE", "VERGEN_CARGO_TARGET_TRIPLE"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let cargo = CargoBuilder::default().target_triple(true).build()?;
    let gitcl = GitclBuilder::default().sha(true).build()?;

    let emitted = Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&gitcl)?
        .emit();

    // Lambda 用のビルドコンテナなど git が使えない環境向け
    if emitted.is_err() {
        for key in FALLBACK_KEYS {
            println!("cargo::rustc-env={key}=unknown");
        }
        let sha = std::env::var("GITHUB_SHA")
            .map(|sha| sha.chars().take(7).collect::<String>())
            .unwrap_or_else(|_| "unknown".to_string());
        println!("cargo::rustc-env=VERGEN_GIT_SHA={sha}");
    }

    println!("cargo::rerun-if-changed=migrations");

    Ok(())
}
