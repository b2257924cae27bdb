use super::{json_pretty, ProvisionerSettings, EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(settings: &ProvisionerSettings, json: bool) -> Result<u8, String> {
    let provisioner = settings.provisioner()?;
    let available = provisioner.available();

    if json {
        let payload = serde_json::json!({
            "backend": provisioner.name(),
            "enclave": settings.enclave,
            "available": available,
        });
        println!("{}", json_pretty(&payload)?);
    } else if available {
        println!("backend '{}' is available", provisioner.name());
    } else {
        println!("backend '{}' is NOT available", provisioner.name());
    }

    Ok(if available { EXIT_SUCCESS } else { EXIT_FAILURE })
}
