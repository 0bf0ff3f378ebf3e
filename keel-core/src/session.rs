use crate::{Model, Result};

/// Group of models whose backend connections are closed together, at the latest on drop.
#[derive(Debug, Default)]
pub struct Session {
    models: Vec<Model>,
}

impl Session {
    pub fn new(models: impl IntoIterator<Item = Model>) -> Self {
        Self {
            models: models.into_iter().collect(),
        }
    }

    pub fn add(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn add_many(&mut self, models: impl IntoIterator<Item = Model>) {
        self.models.extend(models);
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Close the backend of every model, the first failure is returned once all were tried.
    pub fn close(&mut self) -> Result<()> {
        let mut result = Ok(());
        for model in self.models.drain(..) {
            if let Err(e) = model.close_session() {
                log::error!("Could not close the session of {}: {:#}", model.name(), e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
