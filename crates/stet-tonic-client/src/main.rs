//! Runs one create → read → update → delete pass against a `stet-server`.
//!
//! ```bash
//! cargo run --bin stet-server -- --store memory &
//! cargo run --bin stet-client -- --name xyz
//! ```

use anyhow::Context;
use clap::Parser;
use stet_tonic_core::proto::{
    CreatePersonRequest, DeletePersonRequest, Person, ReadPersonRequest, UpdatePersonRequest,
    stet_service_client::StetServiceClient,
};
use tonic::{codec::CompressionEncoding, transport::Channel};

#[derive(Parser, Debug)]
#[command(name = "stet-client", version, about = "Exercise every Person RPC once")]
struct CliArgs {
    /// Server to connect to.
    ///
    /// Environment variable: `SERVER_URI`
    #[arg(long, env = "SERVER_URI", default_value_t = String::from("http://127.0.0.1:50051"))]
    server_uri: String,

    /// Name of the person to create. The update prefixes it with `Changed `.
    #[arg(long, default_value_t = String::from("xyz"))]
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let channel = Channel::from_shared(args.server_uri.clone())
        .with_context(|| format!("invalid server URI {}", args.server_uri))?
        .connect()
        .await
        .with_context(|| format!("could not connect to {}", args.server_uri))?;
    let mut client = StetServiceClient::new(channel).send_compressed(CompressionEncoding::Zstd);

    println!("Creating the person");
    let created = client
        .create_person(CreatePersonRequest {
            person: Some(Person {
                id: String::new(),
                name: args.name.clone(),
            }),
        })
        .await
        .context("create failed")?
        .into_inner()
        .person
        .context("create returned no person")?;
    println!("Person has been created: {:?}", created);
    let person_id = created.id;

    // Failures past this point are reported and the walk-through continues.
    println!("Reading the person");
    match client
        .read_person(ReadPersonRequest {
            person_id: person_id.clone(),
        })
        .await
    {
        Ok(res) => println!("Person was read: {:?}", res.into_inner().person),
        Err(status) => println!("Error while reading: {}", status),
    }

    println!("Updating the person");
    match client
        .update_person(UpdatePersonRequest {
            person: Some(Person {
                id: person_id.clone(),
                name: format!("Changed {}", args.name),
            }),
        })
        .await
    {
        Ok(res) => println!("Person was updated: {:?}", res.into_inner().person),
        Err(status) => println!("Error while updating: {}", status),
    }

    println!("Deleting the person");
    match client
        .delete_person(DeletePersonRequest {
            person_id: person_id.clone(),
        })
        .await
    {
        Ok(res) => println!("Person was deleted: {}", res.into_inner().person_id),
        Err(status) => println!("Error while deleting: {}", status),
    }

    Ok(())
}
