use anyhow::Result;
use beamdrop_core::services::ServiceDescriptor;
use beamdrop_core::BeamdropConfig;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ServicesArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// List services a page can call, without starting the host.
pub fn run_services(args: ServicesArgs, config: BeamdropConfig) -> Result<()> {
    let app = beamdrop_core::application(config)?;
    let services = app.services().describe();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&services)?);
    } else {
        for line in signatures(&services) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// `alloc::string::String` -> `String`
fn short_type(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

fn signatures(services: &[ServiceDescriptor]) -> Vec<String> {
    services
        .iter()
        .flat_map(|service| {
            service.methods.iter().map(move |method| {
                let params: Vec<&str> = method.params.iter().map(|p| short_type(p)).collect();
                format!(
                    "{}.{}({}) -> {}",
                    service.name,
                    method.name,
                    params.join(", "),
                    short_type(method.returns)
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greet_signature() {
        let app = beamdrop_core::application(BeamdropConfig::default()).unwrap();
        let lines = signatures(&app.services().describe());
        assert_eq!(lines, vec!["GreetService.Greet(String) -> String"]);
    }
}
