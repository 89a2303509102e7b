//! Tera templates for changelog entries and release pull request bodies.
//!
//! Templates are parsed once by [`init`] during process start so a broken
//! template fails startup instead of the first reconciliation.
use std::sync::OnceLock;
use tera::{Context, Tera};

use crate::result::Result;

pub const CHANGELOG_TEMPLATE_NAME: &str = "changelog.md";
pub const PULL_REQUEST_TEMPLATE_NAME: &str = "release-pr.md";

/// Changelog entry for one version.
pub const CHANGELOG_TEMPLATE: &str = r#"## [{{ version }}]({{ version_link }})

{% if prefix %}{{ prefix }}

{% endif %}{% if features %}### Features

{% for entry in features %}- {% if entry.breaking %}**BREAKING**: {% endif %}{% if entry.scope %}**{{ entry.scope }}**: {% endif %}{{ entry.description }}{% if entry.identifier %} ([{{ entry.identifier }}]({{ entry.url }})){% endif %}
{% endfor %}
{% endif %}{% if fixes %}### Bug Fixes

{% for entry in fixes %}- {% if entry.breaking %}**BREAKING**: {% endif %}{% if entry.scope %}**{{ entry.scope }}**: {% endif %}{{ entry.description }}{% if entry.identifier %} ([{{ entry.identifier }}]({{ entry.url }})){% endif %}
{% endfor %}
{% endif %}{% if suffix %}{{ suffix }}
{% endif %}"#;

/// Release pull request description. Override sections are left empty for
/// the user to fill in; the `changelog` section is owned by the engine.
pub const PULL_REQUEST_TEMPLATE: &str = r#"<!-- section-start changelog -->
{{ changelog }}
<!-- section-end changelog -->

---

<details>
  <summary><h4>PR by releaser-pleaser 🤖</h4></summary>

If you want to modify the proposed release, add your overrides here. You can learn more about the options in the docs.

## Release Notes

### Prefix / Start

This will be added to the start of the release notes.

<!-- section-start changelog-prefix -->
{{ prefix }}
<!-- section-end changelog-prefix -->

### Suffix / End

This will be added to the end of the release notes.

<!-- section-start changelog-suffix -->
{{ suffix }}
<!-- section-end changelog-suffix -->

## Version

Set to `major`, `minor` or `patch` to force the next version type.

<!-- section-start next-version-type -->
{{ next_version_type }}
<!-- section-end next-version-type -->

</details>
"#;

static TEMPLATES: OnceLock<Templates> = OnceLock::new();

/// Parsed template set.
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Parse all built-in templates.
    pub fn load() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (CHANGELOG_TEMPLATE_NAME, CHANGELOG_TEMPLATE),
            (PULL_REQUEST_TEMPLATE_NAME, PULL_REQUEST_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(name, context)?)
    }
}

/// Parse the templates into process-wide state. Calling it again returns
/// the already parsed set.
pub fn init() -> Result<&'static Templates> {
    if let Some(templates) = TEMPLATES.get() {
        return Ok(templates);
    }

    let templates = Templates::load()?;
    Ok(TEMPLATES.get_or_init(|| templates))
}
