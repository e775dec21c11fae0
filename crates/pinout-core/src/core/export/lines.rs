use pinout_domain::{path_to_url, DependencyPackage, PackageFile};

use super::ExportError;

const ALLOWED_HASH_ALGORITHMS: [&str; 3] = ["sha256", "sha384", "sha512"];

#[derive(Clone, Copy, Debug)]
pub(crate) struct LineOptions {
    pub markers: bool,
    pub hashes: bool,
}

/// One rendered requirement plus the index it was resolved from, if any.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RenderedLine {
    pub text: String,
    pub index: Option<String>,
}

pub(crate) fn render_line(
    item: &DependencyPackage,
    options: LineOptions,
) -> Result<RenderedLine, ExportError> {
    let dependency = &item.dependency;
    let package = &item.package;
    let requirement = dependency.to_pep_508(false, true);

    let source = &dependency.source;
    let remote = source.is_direct_remote();

    let mut text = if remote {
        requirement.clone()
    } else if let Some(path) = source.local_path() {
        let url = path_to_url(path).ok_or_else(|| ExportError::InvalidLocalPath {
            path: path.to_path_buf(),
        })?;
        if package.develop {
            format!("-e {url}")
        } else {
            format!("{} @ {url}", package.complete_name())
        }
    } else {
        format!("{}=={}", package.complete_name(), package.version)
    };

    if !remote && options.markers {
        if let Some((_, markers)) = requirement.split_once(';') {
            let markers = markers.trim();
            if !markers.is_empty() {
                text.push_str(" ; ");
                text.push_str(markers);
            }
        }
    }

    let index = if remote || source.is_direct_local() {
        None
    } else {
        package
            .source_url()
            .map(|url| url.trim_end_matches('/').to_string())
    };

    if options.hashes {
        for hash in sorted_hashes(&package.files) {
            text.push_str(" \\\n    --hash=");
            text.push_str(&hash);
        }
    }

    Ok(RenderedLine { text, index })
}

/// `algorithm:digest` for every file hash with an accepted algorithm, sorted.
/// Bare digests are sha256.
pub(crate) fn sorted_hashes(files: &[PackageFile]) -> Vec<String> {
    let mut hashes: Vec<String> = files
        .iter()
        .filter_map(|file| match file.hash.split_once(':') {
            Some((algorithm, digest)) => ALLOWED_HASH_ALGORITHMS
                .contains(&algorithm)
                .then(|| format!("{algorithm}:{digest}")),
            None => Some(format!("sha256:{}", file.hash)),
        })
        .collect();
    hashes.sort();
    hashes
}
