//! Offline stanza classification.
//!
//! Runs one stanza through an interceptor bound to a gateway domain, backed
//! by an empty in-memory roster, and reports the decision and the stanza as
//! it would continue through the pipeline.

use clap::Args;
use remoteroster_core::{Jid, Stanza};
use remoteroster_plugin::{
    Classification, MemoryRosterStore, MemoryRouter, PacketContext, RemotePacketInterceptor,
};
use std::io::Read;
use std::sync::Arc;

/// Classify command arguments.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Gateway domain the interceptor is bound to
    #[arg(short, long)]
    pub domain: String,

    /// Requesters to treat as already registered with the gateway
    #[arg(long)]
    pub registered: Vec<String>,

    /// Treat the stanza as outbound
    #[arg(long)]
    pub outbound: bool,

    /// Treat the stanza as already processed
    #[arg(long)]
    pub processed: bool,

    /// Stanza file, or '-' for stdin
    pub input: String,
}

/// What happened to one stanza.
#[derive(Debug)]
pub struct ClassifyOutcome {
    pub classification: Classification,
    pub stanza: Stanza,
    pub routed: Vec<Stanza>,
}

/// Classify a stanza given as XML text.
pub async fn classify(args: &ClassifyArgs, xml: &str) -> anyhow::Result<ClassifyOutcome> {
    let domain = Jid::parse(&args.domain)?;
    let router = Arc::new(MemoryRouter::new());
    let interceptor = RemotePacketInterceptor::new(
        domain.clone(),
        Arc::new(MemoryRosterStore::new()),
        router.clone(),
    );

    for requester in &args.registered {
        let requester = Jid::parse(requester)?;
        interceptor
            .registrations()
            .mark_registered(&domain, &requester);
    }

    let mut ctx = if args.outbound {
        PacketContext::outbound()
    } else {
        PacketContext::inbound()
    };
    if args.processed {
        ctx = ctx.processed();
    }

    let mut stanza = Stanza::parse(xml)?;
    let classification = interceptor.handle(&mut stanza, ctx).await?;

    Ok(ClassifyOutcome {
        classification,
        stanza,
        routed: router.routed(),
    })
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut xml = String::new();
        std::io::stdin().read_to_string(&mut xml)?;
        Ok(xml)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

/// Run the classify command.
pub async fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let xml = read_input(&args.input)?;
    let outcome = classify(&args, &xml).await?;

    println!("Classification: {}", outcome.classification);
    println!("Stanza: {}", outcome.stanza.to_xml()?);
    for routed in &outcome.routed {
        println!("Routed: {}", routed.to_xml()?);
    }
    Ok(())
}
