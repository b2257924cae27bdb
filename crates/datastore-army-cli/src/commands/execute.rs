use super::{spin_fail, spin_ok, spinner, ProvisionerSettings, EXIT_SUCCESS};
use datastore_army_core::DatastoreArmy;
use tracing::debug;

pub fn run(settings: &ProvisionerSettings, params: &[String]) -> Result<u8, String> {
    let provisioner = settings.provisioner()?;
    debug!(
        "executing {} payload(s) with {} provisioner in enclave '{}'",
        params.len(),
        provisioner.name(),
        settings.enclave
    );
    let mut army = DatastoreArmy::new();

    for payload in params {
        let pb = spinner(&format!(
            "provisioning datastores in enclave '{}'...",
            settings.enclave
        ));
        match army.execute(provisioner.as_ref(), payload) {
            Ok(result) => {
                spin_ok(
                    &pb,
                    &format!("{} datastore(s) in enclave", army.num_datastores_added()),
                );
                println!("{result}");
            }
            Err(e) => {
                spin_fail(&pb, "provisioning failed");
                return Err(e.to_string());
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
