/// Result slot for one remote resource.
///
/// `begin` bumps the generation and marks the slot loading; `settle` applies a
/// result only when its generation is still current, so a response that lost
/// the race to a newer request is dropped instead of overwriting fresher data.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<T> {
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceView<'a, T> {
    Idle,
    Loading,
    Failed(&'a str),
    Ready(&'a T),
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resource<T> {
    pub fn new() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        self.error = None;
        self.generation
    }

    /// Returns false when the result belonged to a superseded request.
    pub fn settle(&mut self, generation: u64, result: Result<T, String>) -> bool {
        if generation != self.generation || !self.loading {
            return false;
        }
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => {
                self.data = None;
                self.error = Some(if err.trim().is_empty() {
                    "request failed".to_string()
                } else {
                    err
                });
            }
        }
        true
    }

    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.data = None;
        self.loading = false;
        self.error = None;
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> ResourceView<'_, T> {
        if self.loading {
            return ResourceView::Loading;
        }
        if let Some(err) = self.error.as_deref() {
            return ResourceView::Failed(err);
        }
        match self.data.as_ref() {
            Some(data) => ResourceView::Ready(data),
            None => ResourceView::Idle,
        }
    }
}
