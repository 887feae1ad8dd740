//! Test fixtures for component and datasource documents
//!
//! Each fixture carries a definition name and its XML. Fixtures can be written
//! into a backend directory or loaded into a [`MemoryBackend`].

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::MemoryBackend;

/// Test fixture for a component document
#[derive(Clone, Debug)]
pub struct ComponentFixture {
    pub name: String,
    pub content: String,
}

impl ComponentFixture {
    pub fn new(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.trim().to_string(),
        }
    }

    /// One TANGO field written once at init with a fixed 34-element shape
    pub fn mca() -> Self {
        Self::new(
            "mca",
            r#"
<definition>
  <group type="NXentry" name="$var.entryname#'scan'$var.serialno">
    <group type="NXinstrument" name="instrument">
      <group type="NXdetector" name="mca">
        <field name="data" type="NX_FLOAT" units="counts">
          <strategy mode="INIT"/>
          <dimensions rank="1">
            <dim index="1" value="34"/>
          </dimensions>
          <datasource type="TANGO" name="mca_data">
            <device hostname="haso.desy.de" member="attribute" name="p09/mca/exp.01" port="10000"/>
            <record name="Data"/>
          </datasource>
        </field>
      </group>
    </group>
  </group>
</definition>
"#,
        )
    }

    /// A slit whose gap is written per step and once at the end
    pub fn slit() -> Self {
        Self::new(
            "slit",
            r#"
<definition>
  <group type="NXentry" name="entry">
    <group type="NXslit" name="slit1">
      <field name="x_gap" type="NX_FLOAT" units="mm">
        <strategy mode="STEP"/>$datasources.gap</field>
      <field name="x_gap_final" type="NX_FLOAT" units="mm">
        <strategy mode="FINAL"/>$datasources.gap</field>
      <field name="title" type="NX_CHAR">
        <strategy mode="CONFIG"/>$datasources.missing_title</field>
    </group>
  </group>
</definition>
"#,
        )
    }

    /// A 2D image whose second dimension comes from a datasource
    pub fn pilatus() -> Self {
        Self::new(
            "pilatus",
            r#"
<definition>
  <group type="NXentry" name="entry">
    <group type="NXdetector" name="pilatus">
      <field name="data" type="NX_UINT32">
        <strategy mode="STEP"/>
        <dimensions rank="2">
          <dim index="1" value="195"/>
          <dim index="2">
            <strategy mode="CONFIG"/>
            <datasource type="CLIENT" name="roi_size">
              <record name="pilatus_roi"/>
            </datasource>
          </dim>
        </dimensions>
        <datasource type="CLIENT">
          <record name="pilatus_image"/>
        </datasource>
      </field>
    </group>
  </group>
</definition>
"#,
        )
    }

    /// A component that only pulls in others
    pub fn beamline() -> Self {
        Self::new("beamline", "<definition>$components.slit $components.mca</definition>")
    }

    /// Malformed XML
    pub fn invalid() -> Self {
        Self::new("broken", "<definition><field>")
    }

    /// Write the component to `<dir>/components/<name>.xml`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        write_document(dir, "components", &self.name, &self.content)
    }
}

/// Test fixture for a datasource document
#[derive(Clone, Debug)]
pub struct DataSourceFixture {
    pub name: String,
    pub content: String,
}

impl DataSourceFixture {
    pub fn new(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.trim().to_string(),
        }
    }

    /// A client-provided value
    pub fn client(name: &str, record: &str) -> Self {
        Self::new(
            name,
            &format!(
                r#"<definition><datasource type="CLIENT" name="{name}"><record name="{record}"/></datasource></definition>"#
            ),
        )
    }

    /// A Tango attribute on `host`
    pub fn tango(name: &str, host: &str, device: &str, record: &str) -> Self {
        Self::new(
            name,
            &format!(
                r#"<definition><datasource type="TANGO" name="{name}"><device hostname="{host}" member="attribute" name="{device}"/><record name="{record}"/></datasource></definition>"#
            ),
        )
    }

    /// A script declaring `references` and computing `result`
    pub fn pyeval(name: &str, references: &[&str], result: &str) -> Self {
        let tokens: Vec<String> = references.iter().map(|r| format!("$datasources.{r}")).collect();
        Self::new(
            name,
            &format!(
                r#"<definition><datasource type="PYEVAL" name="{name}">{}<result name="result">{result}</result></datasource></definition>"#,
                tokens.join(" ")
            ),
        )
    }

    /// Write the datasource to `<dir>/datasources/<name>.xml`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        write_document(dir, "datasources", &self.name, &self.content)
    }
}

fn write_document(dir: &Path, subdir: &str, name: &str, content: &str) -> Result<PathBuf> {
    let target = dir.join(subdir);
    fs::create_dir_all(&target).with_context(|| format!("Failed to create {}", target.display()))?;
    let path = target.join(format!("{name}.xml"));
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// A [`MemoryBackend`] holding the given fixtures.
pub fn memory_backend(components: &[ComponentFixture], data_sources: &[DataSourceFixture]) -> MemoryBackend {
    let backend = components
        .iter()
        .fold(MemoryBackend::new(), |backend, c| backend.with_component(&c.name, &c.content));
    data_sources
        .iter()
        .fold(backend, |backend, d| backend.with_data_source(&d.name, &d.content))
}
