//! Reverse-proxy configuration files.

use super::Detection;
use crate::fs::{DirEntry, FileSystem};
use crate::stack::TechnologyId;
use regex::Regex;
use std::path::Path;

pub fn detect<F: FileSystem>(fs: &F, project_root: &Path) -> Detection {
    let mut detection = Detection::new();

    let nginx = Regex::new(r"^nginx.*\.conf$").expect("valid regex");
    let apache_root = Regex::new(r"^(apache|httpd).*\.conf$").expect("valid regex");
    let apache_nested = Regex::new(r"^httpd.*\.conf$").expect("valid regex");

    let root_entries = match fs.read_dir(project_root) {
        Ok(entries) => entries,
        Err(e) => {
            detection.skip(project_root, e);
            return detection;
        }
    };

    let mut nested_entries = Vec::new();
    for dir in root_entries
        .iter()
        .filter(|e| e.is_dir() && !e.file_name().starts_with('.'))
    {
        match fs.read_dir(dir.path()) {
            Ok(entries) => nested_entries.extend(entries),
            Err(e) => detection.skip(dir.path(), e),
        }
    }

    if any_file_matches(&root_entries, &nginx) || any_file_matches(&nested_entries, &nginx) {
        detection.push(TechnologyId::Nginx);
    }
    if any_file_matches(&root_entries, &apache_root)
        || any_file_matches(&nested_entries, &apache_nested)
    {
        detection.push(TechnologyId::Apache);
    }

    detection
}

fn any_file_matches(entries: &[DirEntry], pattern: &Regex) -> bool {
    entries
        .iter()
        .any(|e| e.is_file() && pattern.is_match(e.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use yare::parameterized;

    #[parameterized(
        nginx_root = { "nginx.conf", vec![TechnologyId::Nginx] },
        nginx_nested = { "deploy/nginx-site.conf", vec![TechnologyId::Nginx] },
        nginx_too_deep = { "deploy/proxy/nginx.conf", vec![] },
        apache_root = { "apache2.conf", vec![TechnologyId::Apache] },
        httpd_root = { "httpd.conf", vec![TechnologyId::Apache] },
        httpd_nested = { "conf/httpd-vhosts.conf", vec![TechnologyId::Apache] },
        apache_nested_ignored = { "conf/apache.conf", vec![] },
        wrong_extension = { "nginx.conf.bak", vec![] },
    )]
    fn test_proxy_configs(file: &str, expected: Vec<TechnologyId>) {
        let fs = MockFileSystem::new();
        fs.add_file(file, "");

        assert_eq!(detect(&fs, Path::new("/mock")).technologies, expected);
    }

    #[test]
    fn test_both_proxies() {
        let fs = MockFileSystem::new();
        fs.add_file("httpd.conf", "");
        fs.add_file("nginx.conf", "");

        assert_eq!(
            detect(&fs, Path::new("/mock")).technologies,
            vec![TechnologyId::Nginx, TechnologyId::Apache]
        );
    }
}
