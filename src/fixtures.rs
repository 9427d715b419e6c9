#[cfg(test)]
pub mod test {
    use confique::Config;

    use crate::schema::{EntitySchema, FieldKind};
    use crate::tree::OverrideNode;

    /// Five fields, one of each kind. `Host` is declared before `Port`.
    pub fn server_schema() -> EntitySchema {
        EntitySchema::new("Server")
            .field("Host", FieldKind::String)
            .field("Port", FieldKind::Integer)
            .field("Debug", FieldKind::Boolean)
            .field("Ratio", FieldKind::Float)
            .field("Mode", FieldKind::Symbol(vec!["Fast".into(), "Slow".into()]))
    }

    /// `{"dev": {"value": "A"}, "prod": {"eastus": {"value": "B"}, "westus": {"value": "C"}}}`
    pub fn env_region_tree() -> OverrideNode {
        OverrideNode::branch([
            ("dev", OverrideNode::terminal("A")),
            (
                "prod",
                OverrideNode::branch([
                    ("eastus", OverrideNode::terminal("B")),
                    ("westus", OverrideNode::terminal("C")),
                ]),
            ),
        ])
    }

    #[derive(Config, Debug, PartialEq)]
    pub struct ServerConfig {
        /// The server host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,
    }

    #[test]
    fn server_config_loads_defaults() {
        let config = ServerConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
    }
}
