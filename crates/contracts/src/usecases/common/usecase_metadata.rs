/// Метаданные UseCase для идентификации и документирования
pub trait UseCaseMetadata {
    /// Индекс UseCase (например, "u101")
    fn usecase_index() -> &'static str;

    /// Техническое имя (например, "apply_leave")
    fn usecase_name() -> &'static str;

    /// Отображаемое имя для UI
    fn display_name() -> &'static str;

    /// Описание UseCase
    fn description() -> &'static str {
        ""
    }

    /// Полное имя вида "u101_apply_leave"
    fn full_name() -> String {
        format!("{}_{}", Self::usecase_index(), Self::usecase_name())
    }
}
