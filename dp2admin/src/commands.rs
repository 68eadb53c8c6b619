//! Handlers for `dp2admin`'s commands.

use anyhow::Result;
use clap::ArgMatches;
use pipeline_core::cli::templated;
use pipeline_core::client::ServiceClient;
use pipeline_core::error::PipelineError;
use pipeline_core::model::Client;
use pipeline_core::persist;

fn validate_role(role: &str) -> Result<()> {
    match role {
        "ADMIN" | "CLIENTAPP" => Ok(()),
        other => {
            Err(PipelineError::Usage(format!("role must be ADMIN or CLIENTAPP, got '{other}'"))
                .into())
        }
    }
}

fn render_client(c: &Client) -> String {
    format!("{}\t{}\t{}", c.id, c.role, c.contact.as_deref().unwrap_or(""))
}

pub async fn list<C: ServiceClient>(client: &C) -> Result<()> {
    let text = templated(client.clients(), |clients: &Vec<_>| {
        clients.iter().map(render_client).collect::<Vec<_>>().join("\n")
    })
    .await?;
    println!("{text}");
    Ok(())
}

pub async fn create<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").expect("required by clap").clone();
    let secret = sub.get_one::<String>("secret").expect("required by clap").clone();
    let role = sub.get_one::<String>("role").expect("required by clap").clone();
    validate_role(&role)?;
    let contact = sub.get_one::<String>("contact").cloned();

    let created =
        client.new_client(Client { id, secret: Some(secret), role, contact }).await?;
    println!("created client {}", created.id);
    Ok(())
}

pub async fn modify<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("client_id").expect("required by clap").clone();
    let existing = client.client(&id).await?;

    let role = match sub.get_one::<String>("role") {
        Some(r) => {
            validate_role(r)?;
            r.clone()
        }
        None => existing.role,
    };
    let secret = sub.get_one::<String>("secret").cloned().or(existing.secret);
    let contact = sub.get_one::<String>("contact").cloned().or(existing.contact);

    let updated = client.modify_client(Client { id, secret, role, contact }).await?;
    println!("modified client {}", updated.id);
    Ok(())
}

pub async fn delete<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("client_id").expect("required by clap");
    client.delete_client(id).await?;
    println!("deleted client {id}");
    Ok(())
}

pub async fn show_client<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("client_id").expect("required by clap");
    let text = templated(client.client(id), |c: &Client| {
        format!("Id: {}\nRole: {}\nContact: {}", c.id, c.role, c.contact.as_deref().unwrap_or(""))
    })
    .await?;
    println!("{text}");
    Ok(())
}

pub async fn properties<C: ServiceClient>(client: &C) -> Result<()> {
    let text = templated(client.properties(), |props: &Vec<_>| {
        props
            .iter()
            .map(|p: &pipeline_core::model::Property| {
                format!("{}\t{}\t{}", p.name, p.value, p.bundle.as_deref().unwrap_or(""))
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
    .await?;
    println!("{text}");
    Ok(())
}

pub async fn sizes<C: ServiceClient>(client: &C) -> Result<()> {
    let text = templated(client.sizes(), |s: &pipeline_core::model::JobSizes| {
        format!(
            "idle: {}\nrunning: {}\ndone: {}\nerror: {}\ntotal: {}",
            s.idle, s.running, s.done, s.error, s.total
        )
    })
    .await?;
    println!("{text}");
    Ok(())
}

pub async fn halt<C: ServiceClient>(client: &C) -> Result<()> {
    let key = persist::read_halt_key().await?;
    client.halt(&key).await?;
    println!("halted service");
    Ok(())
}
