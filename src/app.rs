use crate::config::{AppConfig, ConfigStore};
use crate::data::{PriceSource, Symbol};
use crate::pipeline::PipelineSession;
use crate::ui::{menu, KeySource, MenuChoice, MenuView, Screen};
use std::sync::Arc;

/// The outer menu loop. Sessions run one at a time; a failed session is
/// reported on the menu instead of ending the program.
pub struct App<D, K> {
    config: AppConfig,
    store: ConfigStore,
    source: Arc<dyn PriceSource>,
    screen: D,
    keyboard: K,
}

impl<D, K> App<D, K>
where
    D: Screen,
    K: KeySource,
{
    pub fn new(
        config: AppConfig,
        store: ConfigStore,
        source: Arc<dyn PriceSource>,
        screen: D,
        keyboard: K,
    ) -> Self {
        Self {
            config,
            store,
            source,
            screen,
            keyboard,
        }
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut notice = None;

        loop {
            let view = MenuView {
                last_symbol: self.config.last_symbol,
                notice: notice.take(),
            };
            self.screen.draw_menu(&view)?;

            let choice = {
                let mut keys = self.keyboard.acquire()?;
                menu::read_choice(&mut keys).await?
            };
            let symbol = match choice {
                MenuChoice::Quit => {
                    tracing::info!("quit from menu");
                    return Ok(());
                }
                MenuChoice::Select(symbol) => symbol,
            };
            self.remember(symbol);

            let keys = self.keyboard.acquire()?;
            let mut session = PipelineSession::new(symbol, self.config.session_settings());
            match session.run(self.source.clone(), &mut self.screen, keys).await {
                Ok(summary) => {
                    tracing::info!(
                        symbol = %summary.symbol,
                        reason = %summary.reason,
                        frames = summary.frames,
                        fetched = summary.fetched,
                        samples = summary.window.len(),
                        "back to menu"
                    );
                }
                Err(e) => {
                    tracing::error!(%symbol, state = ?session.state(), "session failed: {}", e);
                    notice = Some(format!("{} session ended: {}", symbol.pair(), e));
                }
            }
        }
    }

    fn remember(&mut self, symbol: Symbol) {
        if self.config.last_symbol == Some(symbol) {
            return;
        }
        self.config.last_symbol = Some(symbol);
        match self.store.save(&self.config) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(path = ?self.store.path(), "settings file left as is, last symbol not saved")
            }
            Err(e) => tracing::warn!("failed to save settings to {:?}: {}", self.store.path(), e),
        }
    }
}
