/// 设备在告警中的身份信息
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeIdentity<'a> {
    pub name: &'a str,
    pub hostname: Option<&'a str>,
    /// 是否处于 HA/集群模式
    pub clustered: bool,
    /// 是否为当前的主用成员
    pub active_member: bool,
    /// 对端列表中第一个标记为 master/primary 的成员
    pub primary_peer: Option<&'a str>,
}

/// 解析告警使用的节点名
///
/// 集群中的主用成员使用自身名称；否则依次使用主成员名称、主机名、设备名
pub fn resolve_node_name(identity: &NodeIdentity<'_>) -> String {
    if identity.clustered {
        if identity.active_member {
            return identity.name.to_string();
        }
        if let Some(peer) = identity.primary_peer {
            return peer.to_string();
        }
    }

    match identity.hostname {
        Some(hostname) if !hostname.is_empty() => hostname.to_string(),
        _ => identity.name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_cluster_member_uses_own_name() {
        let identity = NodeIdentity {
            name: "bigip-a",
            hostname: Some("bigip-a.example.net"),
            clustered: true,
            active_member: true,
            primary_peer: Some("bigip-b"),
        };
        assert_eq!(resolve_node_name(&identity), "bigip-a");
    }

    #[test]
    fn test_passive_member_uses_primary_peer() {
        let identity = NodeIdentity {
            name: "fw-cluster",
            clustered: true,
            primary_peer: Some("fw-node1"),
            ..Default::default()
        };
        assert_eq!(resolve_node_name(&identity), "fw-node1");
    }

    #[test]
    fn test_fallback_to_hostname_then_name() {
        let identity = NodeIdentity {
            name: "bigip-b",
            hostname: Some("bigip-b.example.net"),
            clustered: true,
            ..Default::default()
        };
        assert_eq!(resolve_node_name(&identity), "bigip-b.example.net");

        let identity = NodeIdentity {
            name: "fw01",
            hostname: Some(""),
            ..Default::default()
        };
        assert_eq!(resolve_node_name(&identity), "fw01");
    }

    #[test]
    fn test_standalone_ignores_peers() {
        let identity = NodeIdentity {
            name: "fw01",
            active_member: true,
            primary_peer: Some("fw02"),
            ..Default::default()
        };
        assert_eq!(resolve_node_name(&identity), "fw01");
    }
}
