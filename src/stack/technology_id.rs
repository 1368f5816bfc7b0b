crate::define_id_enum! {
    /// Technology identifier: the only currency exchanged between detection and templating
    TechnologyId {
        Node => "node" : "Node.js" | "nodejs" | "typescript",
        Spring => "spring" : "Spring Boot" | "spring-boot" | "java",
        Php => "php" : "PHP",
        Go => "go" : "Go" | "golang",
        Cpp => "cpp" : "C++" | "c++",
        Ruby => "ruby" : "Ruby",
        DotNet => "dotnet" : ".NET" | "csharp",
        Postgres => "postgres" : "PostgreSQL" | "postgresql",
        Python => "python" : "Python",
        MySql => "mysql" : "MySQL",
        MariaDb => "mariadb" : "MariaDB",
        Cassandra => "cassandra" : "Cassandra",
        Nginx => "nginx" : "Nginx",
        Apache => "apache" : "Apache httpd" | "httpd",
        Django => "django" : "Django",
        Flask => "flask" : "Flask",
        Jupyter => "jupyter" : "Jupyter",
        Rust => "rust" : "Rust",
        Scala => "scala" : "Scala",
        Elixir => "elixir" : "Elixir",
        Laravel => "laravel" : "Laravel",
        FastApi => "fastapi" : "FastAPI",
        Vue => "vue" : "Vue",
        React => "react" : "React",
        Angular => "angular" : "Angular",
        MongoDb => "mongodb" : "MongoDB" | "mongo",
        Redis => "redis" : "Redis",
        Elasticsearch => "elasticsearch" : "Elasticsearch" | "elastic",
    }
}

impl TechnologyId {
    /// Runtime whose project metadata determines this technology's image version.
    pub fn version_source(&self) -> TechnologyId {
        match self {
            Self::Django | Self::Flask | Self::FastApi => Self::Python,
            Self::Vue | Self::React | Self::Angular => Self::Node,
            other => other.clone(),
        }
    }
}
