pub mod options {

    pub const SYSTEM_INITIALIZED: &str = "system_initialized";

    pub const ALLOW_REGISTRATION: &str = "allow_registration";

    pub const SYSTEM_NAME: &str = "system_name";

    pub const TRUE: &str = "true";

    pub const FALSE: &str = "false";

    /// A well-known option and the value it is seeded with on first run.
    #[derive(Debug, Clone, Copy)]
    pub struct DefaultOption {
        pub name: &'static str,
        pub value: &'static str,
        pub auto_load: bool,
        pub return_to_frontend: bool,
        pub description: &'static str,
    }

    /// Registry of options created by the bootstrap step.
    ///
    /// Registration is closed until an administrator opens it.
    pub const DEFAULTS: &[DefaultOption] = &[
        DefaultOption {
            name: SYSTEM_INITIALIZED,
            value: FALSE,
            auto_load: true,
            return_to_frontend: false,
            description: "Whether the system has completed first-run initialization",
        },
        DefaultOption {
            name: ALLOW_REGISTRATION,
            value: FALSE,
            auto_load: true,
            return_to_frontend: true,
            description: "Whether new users may register themselves",
        },
        DefaultOption {
            name: SYSTEM_NAME,
            value: "Admin Console",
            auto_load: true,
            return_to_frontend: true,
            description: "Display name of the system",
        },
    ];
}

pub mod admin {

    pub const USERNAME: &str = "admin";

    pub const DEFAULT_PASSWORD: &str = "admin";
}

pub mod token {

    pub const DEFAULT_LIFETIME_HOURS: i64 = 24;
}

pub mod limits {

    pub const MAX_USERNAME_LEN: usize = 64;

    pub const MIN_PASSWORD_LEN: usize = 6;

    pub const RESET_PASSWORD_LEN: usize = 12;
}
