use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use tokio::time::{Duration, Instant};
use tracing::info;

use ttlmemo_cache::{CacheError, TtlCache};
use ttlmemo_common::DEFAULT_TTL_MS;

/// Política de leitura aplicada a cada chave.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Policy {
    /// Recomputa de forma síncrona quando vencido.
    #[default]
    Remember,
    /// Serve o valor vencido e recomputa em background.
    Swr,
    /// Só inspeciona, nunca computa.
    Get,
}

fn parse_policy(s: &str) -> Result<Policy, String> {
    match s.to_lowercase().as_str() {
        "remember" => Ok(Policy::Remember),
        "swr" => Ok(Policy::Swr),
        "get" => Ok(Policy::Get),
        _ => Err(format!("valor inválido: '{s}'. Use: remember, swr, get")),
    }
}

#[derive(Parser, Debug)]
#[command(name = "ttlmemo-cli", about = "Demo interativa do cache de memoização com TTL")]
struct Args {
    #[arg(long, default_value_t = DEFAULT_TTL_MS)]
    ttl_ms: u64,
    /// Latência simulada de cada computação
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
    #[arg(long, default_value = "remember", value_parser = parse_policy)]
    policy: Policy,
}

/// Linha digitada pelo usuário.
#[derive(Debug, PartialEq)]
enum Input {
    Key(String),
    SetPolicy(Policy),
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Ok(Input::Quit);
    }
    if let Some(rest) = line.strip_prefix(":policy") {
        return parse_policy(rest.trim()).map(Input::SetPolicy);
    }
    Ok(Input::Key(line.to_string()))
}

/// Lookup lento simulado: cada chamada gera uma nova versão.
#[derive(Clone)]
struct SlowLookup {
    delay: Duration,
    version: Arc<AtomicU64>,
}

impl SlowLookup {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    async fn fetch(self, key: String) -> String {
        tokio::time::sleep(self.delay).await;
        let v = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{key}@v{v}")
    }
}

async fn run_policy(
    cache: &TtlCache<String>,
    lookup: &SlowLookup,
    policy: Policy,
    key: String,
) -> String {
    match policy {
        Policy::Remember => {
            let lookup = lookup.clone();
            let k = key.clone();
            let value = cache.remember_async(key, move || lookup.fetch(k)).await;
            format!("\"{value}\"")
        }
        Policy::Swr => {
            let lookup = lookup.clone();
            let k = key.clone();
            let value = cache
                .get_stale_then_recompute_async(key, move || lookup.fetch(k))
                .await;
            format!("\"{value}\"")
        }
        Policy::Get => format_lookup(cache.get(&key).map(|l| l.into_parts())),
    }
}

/// Formata o resultado de `get` para exibição humana.
fn format_lookup(result: Result<(String, bool), CacheError>) -> String {
    match result {
        Ok((value, false)) => format!("\"{value}\""),
        Ok((value, true)) => format!("\"{value}\" (expired)"),
        Err(CacheError::NotFound) => "(nil)".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlmemo_cli=info,ttlmemo_cache=debug".into()),
        )
        .init();

    let args = Args::parse();
    let cache = TtlCache::new(Duration::from_millis(args.ttl_ms));
    let lookup = SlowLookup::new(Duration::from_millis(args.delay_ms));
    let mut policy = args.policy;

    info!("ttl={}ms delay={}ms policy={policy:?}", args.ttl_ms, args.delay_ms);

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("ttlmemo> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        match parse_input(&input) {
            Ok(Input::Empty) => continue,
            Ok(Input::Quit) => break,
            Ok(Input::SetPolicy(p)) => {
                policy = p;
                println!("policy: {policy:?}");
            }
            Ok(Input::Key(key)) => {
                let start = Instant::now();
                let out = run_policy(&cache, &lookup, policy, key).await;
                println!("{out} ({:?})", start.elapsed());
            }
            Err(e) => println!("(error) {e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_policy_case_insensitive() {
        assert_eq!(parse_policy("SWR"), Ok(Policy::Swr));
        assert_eq!(parse_policy("remember"), Ok(Policy::Remember));
        assert!(parse_policy("lru").is_err());
    }

    #[test]
    fn parse_input_variants() {
        assert_eq!(parse_input("  \n"), Ok(Input::Empty));
        assert_eq!(parse_input("EXIT"), Ok(Input::Quit));
        assert_eq!(parse_input(":policy get"), Ok(Input::SetPolicy(Policy::Get)));
        assert_eq!(parse_input("user:42\n"), Ok(Input::Key("user:42".into())));
        assert!(parse_input(":policy nope").is_err());
    }

    #[test]
    fn format_lookup_states() {
        assert_eq!(format_lookup(Ok(("a".into(), false))), "\"a\"");
        assert_eq!(format_lookup(Ok(("a".into(), true))), "\"a\" (expired)");
        assert_eq!(format_lookup(Err(CacheError::NotFound)), "(nil)");
    }

    #[tokio::test]
    async fn remember_policy_reuses_fresh_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let lookup = SlowLookup::new(Duration::ZERO);

        let first = run_policy(&cache, &lookup, Policy::Remember, "k".into()).await;
        let second = run_policy(&cache, &lookup, Policy::Remember, "k".into()).await;
        assert_eq!(first, "\"k@v1\"");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_policy_never_computes() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let lookup = SlowLookup::new(Duration::ZERO);

        let out = run_policy(&cache, &lookup, Policy::Get, "k".into()).await;
        assert_eq!(out, "(nil)");
        assert_eq!(lookup.version.load(Ordering::SeqCst), 0);
    }
}
