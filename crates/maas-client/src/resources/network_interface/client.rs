//! Interface collection and per-interface link management.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, info};

use super::models::{InterfaceLink, IpConfigurationUpdate, LinkMode, NetworkInterface};
use crate::client::ApiClient;
use crate::error::{MaasError, Result};
use crate::params::Params;
use crate::resources::keys::{
    ID, IP_ADDRESS, MODE, OPERATION, OP_LINK_SUBNET, OP_UNLINK_SUBNET, SUBNET,
};
use crate::resources::machine::MachineHandle;

fn interfaces_api_path(system_id: &str) -> String {
    format!("/nodes/{system_id}/interfaces/")
}

/// Interfaces of any machine, addressed by system id.
#[derive(Debug, Clone)]
pub struct NetworkInterfaces {
    client: Arc<ApiClient>,
}

impl NetworkInterfaces {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List every interface of a machine.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, system_id: &str) -> Result<Vec<NetworkInterface>> {
        let envelope = self
            .client
            .get(&interfaces_api_path(system_id), &Params::new())
            .await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Handle for one interface. No request is made.
    #[must_use]
    pub fn interface(&self, system_id: &str, interface_id: &str) -> InterfaceHandle {
        InterfaceHandle::new(Arc::clone(&self.client), system_id, interface_id)
    }

    /// Give a machine's boot interface a static address.
    ///
    /// Fetches the machine, then its boot interface, then applies
    /// [`InterfaceHandle::set_static_ip`].
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] if the machine has no boot
    /// interface, plus anything the individual steps return.
    pub async fn set_boot_interface_static_ip(&self, system_id: &str, ip: IpAddr) -> Result<()> {
        let machine = MachineHandle::new(Arc::clone(&self.client), system_id)
            .get()
            .await?;
        let boot_id = machine.boot_interface_id.ok_or_else(|| {
            MaasError::InvalidState(format!("machine {system_id} has no boot interface"))
        })?;

        let mut handle = self.interface(system_id, &boot_id);
        let iface = handle.get().await?;
        handle.set_static_ip(&iface, ip).await
    }
}

/// One interface of one machine.
#[derive(Debug, Clone)]
pub struct InterfaceHandle {
    client: Arc<ApiClient>,
    system_id: String,
    interface_id: String,
    api_path: String,
    params: Params,
}

impl InterfaceHandle {
    fn new(client: Arc<ApiClient>, system_id: &str, interface_id: &str) -> Self {
        Self {
            client,
            system_id: system_id.to_string(),
            interface_id: interface_id.to_string(),
            api_path: format!("{}{interface_id}/", interfaces_api_path(system_id)),
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    #[must_use]
    pub fn interface_id(&self) -> &str {
        &self.interface_id
    }

    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn get(&self) -> Result<NetworkInterface> {
        self.client
            .get(&self.api_path, &Params::new())
            .await?
            .into_value()
    }

    /// Link a subnet: static with `ip`, DHCP without.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects the link.
    pub async fn link_subnet(&mut self, subnet_id: i64, ip: Option<IpAddr>) -> Result<()> {
        let mode = if ip.is_some() {
            LinkMode::Static
        } else {
            LinkMode::Dhcp
        };
        self.link_subnet_with_mode(subnet_id, mode, ip).await
    }

    /// Link a subnet with an explicit mode.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects the link.
    pub async fn link_subnet_with_mode(
        &mut self,
        subnet_id: i64,
        mode: LinkMode,
        ip: Option<IpAddr>,
    ) -> Result<()> {
        self.params.reset();
        self.params
            .set(OPERATION, OP_LINK_SUBNET)
            .set(SUBNET, subnet_id.to_string())
            .set(MODE, mode.as_str());
        if let Some(ip) = ip {
            self.params.set(IP_ADDRESS, ip.to_string());
        }

        info!(
            system_id = %self.system_id,
            interface = %self.interface_id,
            subnet_id,
            mode = %mode,
            "Linking subnet"
        );
        self.client
            .post(&self.api_path, &self.params)
            .await?
            .ensure_success()
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the unlink.
    pub async fn unlink_subnet(&mut self, link_id: &str) -> Result<()> {
        self.params.reset();
        self.params
            .set(OPERATION, OP_UNLINK_SUBNET)
            .set(ID, link_id);

        info!(
            system_id = %self.system_id,
            interface = %self.interface_id,
            link_id,
            "Unlinking subnet"
        );
        self.client
            .post(&self.api_path, &self.params)
            .await?
            .ensure_success()
    }

    /// Replace a link: unlink it, then link again with the new settings.
    ///
    /// The two calls are not atomic. If the relink fails the interface is
    /// left without the link.
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] if `update` is incomplete, or the
    /// error of whichever call failed.
    pub async fn update_ip_configuration(&mut self, update: IpConfigurationUpdate) -> Result<()> {
        update.validate()?;
        let subnet_id = update.subnet_id.ok_or_else(|| {
            MaasError::InvalidState("subnet id is required".to_string())
        })?;

        self.unlink_subnet(&update.link_id).await?;
        let ip = if update.mode == LinkMode::Static {
            update.ip_address
        } else {
            None
        };
        self.link_subnet_with_mode(subnet_id, update.mode, ip).await
    }

    /// Move `iface` (the snapshot of this interface) to a static address.
    ///
    /// With links, the preferred link is re-created as static on the same
    /// subnet. Without links but with children (a bridge), the first child
    /// that has links is configured instead.
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] when neither links nor a linked
    /// child exist, or the chosen link has no subnet.
    pub async fn set_static_ip(&mut self, iface: &NetworkInterface, ip: IpAddr) -> Result<()> {
        if !iface.links.is_empty() {
            return self.set_static_ip_on(&iface.links, ip).await;
        }

        if !iface.children.is_empty() {
            let siblings = NetworkInterfaces::new(Arc::clone(&self.client))
                .list(&self.system_id)
                .await?;
            let child = iface
                .children
                .iter()
                .find_map(|name| {
                    siblings
                        .iter()
                        .find(|candidate| candidate.name == *name && !candidate.links.is_empty())
                })
                .ok_or_else(|| {
                    MaasError::InvalidState(format!(
                        "no child of interface {} has links",
                        iface.name
                    ))
                })?;

            debug!(parent = %iface.name, child = %child.name, "Configuring child interface");
            let mut handle =
                InterfaceHandle::new(Arc::clone(&self.client), &self.system_id, &child.id);
            return handle.set_static_ip_on(&child.links, ip).await;
        }

        Err(MaasError::InvalidState(format!(
            "interface {} has no links and no children",
            iface.name
        )))
    }

    /// Switch `iface` to DHCP on `subnet_id`, reusing its first link if any.
    ///
    /// # Errors
    /// Returns error if a request fails.
    pub async fn set_dhcp(&mut self, iface: &NetworkInterface, subnet_id: i64) -> Result<()> {
        match iface.links.first() {
            Some(link) => {
                self.update_ip_configuration(IpConfigurationUpdate {
                    link_id: link.id.clone(),
                    mode: LinkMode::Dhcp,
                    ip_address: None,
                    subnet_id: Some(subnet_id),
                })
                .await
            }
            None => self.link_subnet(subnet_id, None).await,
        }
    }

    async fn set_static_ip_on(&mut self, links: &[InterfaceLink], ip: IpAddr) -> Result<()> {
        let link = selected_link(links)
            .ok_or_else(|| MaasError::InvalidState("interface has no links".to_string()))?;
        let subnet = link.subnet.as_ref().ok_or_else(|| {
            MaasError::InvalidState(format!("link {} has no subnet", link.id))
        })?;

        self.update_ip_configuration(IpConfigurationUpdate {
            link_id: link.id.clone(),
            mode: LinkMode::Static,
            ip_address: Some(ip),
            subnet_id: Some(subnet.id),
        })
        .await
    }
}

/// First DHCP link, else first link with a subnet, else first link.
fn selected_link(links: &[InterfaceLink]) -> Option<&InterfaceLink> {
    links
        .iter()
        .find(|link| link.mode == LinkMode::Dhcp)
        .or_else(|| links.iter().find(|link| link.subnet.is_some()))
        .or_else(|| links.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::subnet::Subnet;

    fn link(id: &str, mode: LinkMode, subnet_id: Option<i64>) -> InterfaceLink {
        InterfaceLink {
            id: id.to_string(),
            mode,
            subnet: subnet_id.map(|id| Subnet {
                id,
                ..Subnet::default()
            }),
            ip_address: None,
        }
    }

    #[test]
    fn test_selected_link_prefers_dhcp() {
        let links = vec![
            link("1", LinkMode::Static, Some(1)),
            link("2", LinkMode::Dhcp, Some(2)),
        ];
        assert_eq!(selected_link(&links).unwrap().id, "2");
    }

    #[test]
    fn test_selected_link_falls_back_to_subnet_then_first() {
        let links = vec![
            link("1", LinkMode::LinkUp, None),
            link("2", LinkMode::Auto, Some(2)),
        ];
        assert_eq!(selected_link(&links).unwrap().id, "2");

        let links = vec![
            link("1", LinkMode::LinkUp, None),
            link("2", LinkMode::Auto, None),
        ];
        assert_eq!(selected_link(&links).unwrap().id, "1");
        assert!(selected_link(&[]).is_none());
    }

    #[test]
    fn test_handle_api_path() {
        let client = Arc::new(ApiClient::new("http://maas.local/MAAS", "ck:tk:ts").unwrap());
        let handle = NetworkInterfaces::new(client).interface("abc123", "12");
        assert_eq!(handle.api_path, "/nodes/abc123/interfaces/12/");
    }

    #[tokio::test]
    async fn test_static_ip_without_links_or_children_fails() {
        let client = Arc::new(ApiClient::new("http://maas.local/MAAS", "ck:tk:ts").unwrap());
        let mut handle = NetworkInterfaces::new(client).interface("abc123", "12");
        let iface = NetworkInterface {
            name: "eth0".to_string(),
            ..NetworkInterface::default()
        };

        let result = handle.set_static_ip(&iface, "10.0.0.9".parse().unwrap()).await;
        assert!(matches!(result, Err(MaasError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_static_ip_on_link_without_subnet_fails() {
        let client = Arc::new(ApiClient::new("http://maas.local/MAAS", "ck:tk:ts").unwrap());
        let mut handle = NetworkInterfaces::new(client).interface("abc123", "12");
        let iface = NetworkInterface {
            links: vec![link("1", LinkMode::LinkUp, None)],
            ..NetworkInterface::default()
        };

        let result = handle.set_static_ip(&iface, "10.0.0.9".parse().unwrap()).await;
        assert!(matches!(result, Err(MaasError::InvalidState(_))));
    }
}
